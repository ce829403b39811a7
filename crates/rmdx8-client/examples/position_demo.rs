//! 位置闭环示例 - 单电机快速入门
//!
//! 演示连接 SocketCAN 总线、读取电机状态、执行限速位置闭环并
//! 轮询多圈角度直到到位。
//!
//! # 运行
//!
//! ```bash
//! # 先启动 CAN 接口（真实硬件或 vcan）
//! sudo ip link set up can0
//! cargo run --example position_demo
//! ```

#[cfg(target_os = "linux")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use rmdx8_can::SocketCanAdapter;
    use rmdx8_client::{Motor, MotorId};
    use std::time::Duration;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("🚀 RMD-X8 - Position Demo");
    println!("=========================\n");

    // 1. 打开总线，连接 1 号电机
    let bus = SocketCanAdapter::new("can0")?;
    let mut motor = Motor::new(bus, MotorId::new(1)?);

    // 2. 读取基础状态
    let status = motor.read_motor_status_1()?;
    println!("🌡️  温度: {} ℃", status.temperature);
    println!("🔋 母线电压: {:.1} V", status.voltage());
    if status.error_flags.any() {
        println!("⚠️  错误标志未清除，尝试清除...");
        motor.clear_motor_error_flag()?;
    }

    let angle = motor.read_multi_turns_angle()?;
    println!("📍 当前多圈角度: {:.2}°\n", angle.degrees());

    // 3. 限速移动到 +90°
    let target = 90.0;
    println!("🎯 目标角度: {target:.2}°（最大转速 360 °/s）\n");
    motor.position_closed_loop_2(target, 360.0)?;

    // 4. 轮询角度直到到位
    loop {
        let angle = motor.read_multi_turns_angle()?;
        println!("   角度: {:8.2}°", angle.degrees());
        if (angle.degrees() - target).abs() < 0.5 {
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    // 5. 停止电机
    motor.motor_stop()?;
    println!("\n✅ 到位，电机已停止");

    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn main() {
    eprintln!("This demo requires Linux SocketCAN.");
}
