//! 数值编解码（ValueCodec）
//!
//! 负责物理量与帧内原始整数之间的纯函数转换。每个字段由
//! [`FieldSpec`] 静态声明：负载内偏移、字节宽度与符号、缩放系数、
//! 物理单位。编码规则 `raw = round(physical / scale)`，解码规则
//! `physical = raw * scale`；有符号字段按声明宽度使用二进制补码，
//! 字节序统一为小端（全协议一致，不按字段声明）。

use crate::ProtocolError;

/// 字段携带的物理单位标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// 角度（°）
    Degrees,
    /// 角速度（°/s）
    DegreesPerSecond,
    /// 角加速度（°/s²）
    DegreesPerSecondSquared,
    /// 电流（A）
    Amperes,
    /// 温度（℃）
    Celsius,
    /// 电压（V）
    Volts,
    /// 无量纲原始计数（编码器计数、增益、标志位等）
    Count,
}

/// 字段的字节宽度与符号
///
/// `I56` 是多圈角度专用的 7 字节补码整数（`DATA[1..8]`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldWidth {
    U8,
    I8,
    U16,
    I16,
    I32,
    I56,
}

impl FieldWidth {
    /// 字段占用的字节数
    pub const fn len(self) -> usize {
        match self {
            FieldWidth::U8 | FieldWidth::I8 => 1,
            FieldWidth::U16 | FieldWidth::I16 => 2,
            FieldWidth::I32 => 4,
            FieldWidth::I56 => 7,
        }
    }

    /// 原始整数的可表示区间（闭区间）
    pub const fn raw_range(self) -> (i64, i64) {
        match self {
            FieldWidth::U8 => (0, u8::MAX as i64),
            FieldWidth::I8 => (i8::MIN as i64, i8::MAX as i64),
            FieldWidth::U16 => (0, u16::MAX as i64),
            FieldWidth::I16 => (i16::MIN as i64, i16::MAX as i64),
            FieldWidth::I32 => (i32::MIN as i64, i32::MAX as i64),
            FieldWidth::I56 => (-(1 << 55), (1 << 55) - 1),
        }
    }

    const fn is_signed(self) -> bool {
        matches!(
            self,
            FieldWidth::I8 | FieldWidth::I16 | FieldWidth::I32 | FieldWidth::I56
        )
    }
}

/// 帧内单个数值字段的静态描述
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// 在 8 字节帧数据内的字节偏移（含命令字节，即 `DATA[offset]` 起）
    pub offset: usize,
    /// 字节宽度与符号
    pub width: FieldWidth,
    /// 缩放系数：`physical = raw * scale`
    pub scale: f64,
    /// 物理单位
    pub unit: Unit,
}

impl FieldSpec {
    pub const fn new(offset: usize, width: FieldWidth, scale: f64, unit: Unit) -> Self {
        Self {
            offset,
            width,
            scale,
            unit,
        }
    }

    /// 将物理量编码进帧数据
    ///
    /// 超出字段可表示范围返回 [`ProtocolError::OutOfRange`]，
    /// 此时 `data` 保持原样（不产生半成品帧）。
    pub fn encode(&self, value: f64, data: &mut [u8; 8]) -> Result<(), ProtocolError> {
        let raw = (value / self.scale).round();
        let (min, max) = self.width.raw_range();
        if !(raw >= min as f64 && raw <= max as f64) {
            return Err(ProtocolError::OutOfRange { value, min, max });
        }

        let n = self.width.len();
        let bytes = (raw as i64).to_le_bytes();
        data[self.offset..self.offset + n].copy_from_slice(&bytes[..n]);
        Ok(())
    }

    /// 从帧数据读取原始整数（按宽度做符号扩展）
    pub fn decode_raw(&self, data: &[u8; 8]) -> i64 {
        let n = self.width.len();
        let mut bytes = [0u8; 8];
        bytes[..n].copy_from_slice(&data[self.offset..self.offset + n]);
        let unsigned = u64::from_le_bytes(bytes);

        if self.width.is_signed() {
            // 小端低位对齐后左移再算术右移完成符号扩展
            let shift = 64 - 8 * n as u32;
            ((unsigned << shift) as i64) >> shift
        } else {
            unsigned as i64
        }
    }

    /// 从帧数据解码物理量
    pub fn decode(&self, data: &[u8; 8]) -> f64 {
        self.decode_raw(data) as f64 * self.scale
    }
}
