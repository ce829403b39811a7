//! 单电机门面集成测试
//!
//! 用 mock 适配器扮演总线另一端的电机：写类命令回显、读类命令
//! 按寄存器表布局应答，覆盖请求编码、应答关联与解码的全链路。

use rmdx8_can::MockAdapter;
use rmdx8_client::{
    CanError, Command, Motor, MotorError, MotorId, PidGains, ProtocolError, RmdFrame,
    SpinDirection,
};

const MOTOR: u8 = 1;
const REPLY_ID: u32 = 0x141;

fn motor_id() -> MotorId {
    MotorId::new(MOTOR).unwrap()
}

/// 模拟一台电机：保存 PID 增益与转速，按命令表应答
fn fake_motor(speed: i16) -> impl FnMut(&RmdFrame) -> Option<RmdFrame> + Send + 'static {
    let mut pid = [0u8; 6];
    move |request: &RmdFrame| {
        let mut data = [0u8; 8];
        data[0] = request.command_byte();
        match request.command_byte() {
            // 读 PID：增益在 DATA[2..8]
            0x30 => data[2..8].copy_from_slice(&pid),
            // 写 PID：存下并回显
            0x31 | 0x32 => {
                pid.copy_from_slice(&request.data[2..8]);
                return Some(*request);
            },
            // 状态 2：温度 40℃、转速、编码器 0
            0x9C | 0xA1..=0xA6 => {
                data[1] = 40;
                data[4..6].copy_from_slice(&speed.to_le_bytes());
            },
            // 单圈角度：1800 × 0.01° = 18.00°
            0x94 => data[6..8].copy_from_slice(&1800u16.to_le_bytes()),
            // 其余命令纯回显
            _ => return Some(*request),
        }
        Some(RmdFrame::new(request.id, data))
    }
}

#[test]
fn write_pid_ram_then_read_pid_returns_identical_gains() {
    let bus = MockAdapter::with_responder(fake_motor(0));
    let mut motor = Motor::new(bus, motor_id());

    let gains = PidGains {
        position_kp: 50,
        position_ki: 0,
        speed_kp: 30,
        speed_ki: 20,
        torque_kp: 10,
        torque_ki: 5,
    };

    let echo = motor.write_pid_ram(gains).unwrap();
    assert_eq!(echo, gains);

    let read_back = motor.read_pid().unwrap();
    assert_eq!(read_back, gains);
}

#[test]
fn read_single_turn_angle_scales_raw_count() {
    let bus = MockAdapter::with_responder(fake_motor(0));
    let mut motor = Motor::new(bus, motor_id());

    let angle = motor.read_single_turn_angle().unwrap();
    assert_eq!(angle.raw, 1800);
    assert_eq!(angle.degrees(), 18.0);
}

#[test]
fn motor_running_reports_rotation_from_status() {
    // 转速非零 → true
    let bus = MockAdapter::with_responder(fake_motor(360));
    let mut motor = Motor::new(bus, motor_id());
    assert!(motor.motor_running().unwrap());

    // 转速为零 → false
    let bus = MockAdapter::with_responder(fake_motor(0));
    let mut motor = Motor::new(bus, motor_id());
    assert!(!motor.motor_running().unwrap());
}

#[test]
fn position_closed_loop_1_payload_roundtrips_through_field_spec() {
    let mut bus = MockAdapter::with_responder(fake_motor(0));
    let mut motor = Motor::new(&mut bus, motor_id());
    motor.position_closed_loop_1(90.0).unwrap();

    let sent = bus.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].id, REPLY_ID);
    assert_eq!(sent[0].command_byte(), 0xA3);

    // 同一字段描述解码发出的负载，必须还原 90.0
    let spec = Command::PositionClosedLoop1.spec().request_fields[0];
    assert_eq!(spec.decode(&sent[0].data), 90.0);
}

#[test]
fn reply_with_wrong_command_byte_is_rejected() {
    let mut bus = MockAdapter::new();
    // 对 0x30 请求塞回一条 0x9C 应答
    bus.push_reply(RmdFrame::new(REPLY_ID, [0x9C, 0, 0, 0, 0, 0, 0, 0]));
    let mut motor = Motor::new(bus, motor_id());

    let err = motor.read_pid().unwrap_err();
    match err {
        MotorError::Protocol(ProtocolError::UnexpectedCommand { expected, actual }) => {
            assert_eq!(expected, 0x30);
            assert_eq!(actual, 0x9C);
        },
        other => panic!("expected UnexpectedCommand, got {other:?}"),
    }
}

#[test]
fn reply_from_another_motor_is_rejected() {
    let mut bus = MockAdapter::new();
    // 电机 2（0x142）的应答不得归属到电机 1
    bus.push_reply(RmdFrame::new(0x142, [0x30, 0, 0, 0, 0, 0, 0, 0]));
    let mut motor = Motor::new(bus, motor_id());

    let err = motor.read_pid().unwrap_err();
    assert!(matches!(
        err,
        MotorError::Protocol(ProtocolError::UnexpectedCanId { .. })
    ));
}

#[test]
fn silent_bus_surfaces_timeout() {
    let bus = MockAdapter::new();
    let mut motor = Motor::new(bus, motor_id());

    let err = motor.read_motor_status_2().unwrap_err();
    assert!(err.is_timeout());
    assert!(matches!(err, MotorError::Can(CanError::Timeout)));
}

#[test]
fn out_of_range_torque_sends_nothing() {
    let mut bus = MockAdapter::with_responder(fake_motor(0));
    let mut motor = Motor::new(&mut bus, motor_id());

    // 上限 32 A
    let err = motor.torque_closed_loop(40.0).unwrap_err();
    assert!(matches!(
        err,
        MotorError::Protocol(ProtocolError::OutOfRange { .. })
    ));
    assert!(bus.sent().is_empty());
}

#[test]
fn write_encoder_offset_echoes_offset() {
    let bus = MockAdapter::echo();
    let mut motor = Motor::new(bus, motor_id());

    let echo = motor.write_encoder_offset(12345).unwrap();
    assert_eq!(echo.offset, 12345);
}

#[test]
fn read_multi_turns_angle_handles_negative_accumulation() {
    let mut bus = MockAdapter::new();
    let mut data = [0u8; 8];
    data[0] = 0x92;
    // -720.00°
    data[1..8].copy_from_slice(&(-72000i64).to_le_bytes()[..7]);
    bus.push_reply(RmdFrame::new(REPLY_ID, data));
    let mut motor = Motor::new(bus, motor_id());

    let angle = motor.read_multi_turns_angle().unwrap();
    assert_eq!(angle.degrees(), -720.0);
}

#[test]
fn clear_motor_error_flag_returns_status() {
    let mut bus = MockAdapter::new();
    let mut data = [0u8; 8];
    data[0] = 0x9B;
    data[1] = 30;
    data[3..5].copy_from_slice(&480u16.to_le_bytes());
    bus.push_reply(RmdFrame::new(REPLY_ID, data));
    let mut motor = Motor::new(bus, motor_id());

    let status = motor.clear_motor_error_flag().unwrap();
    assert_eq!(status.voltage(), 48.0);
    assert!(!status.error_flags.any());
}

#[test]
fn position_closed_loop_4_orders_fields_per_catalog() {
    let mut bus = MockAdapter::with_responder(fake_motor(0));
    let mut motor = Motor::new(&mut bus, motor_id());
    motor
        .position_closed_loop_4(180.0, SpinDirection::CounterClockwise, 500.0)
        .unwrap();

    let sent = &bus.sent()[0];
    assert_eq!(sent.data[0], 0xA6);
    assert_eq!(sent.data[1], 0x01);
    assert_eq!(&sent.data[2..4], &500u16.to_le_bytes());
    assert_eq!(&sent.data[4..6], &18000u16.to_le_bytes());
}

#[test]
fn sequential_motors_share_one_adapter() {
    let mut bus = MockAdapter::echo();

    let mut first = Motor::new(&mut bus, MotorId::new(1).unwrap());
    first.motor_stop().unwrap();

    let mut second = Motor::new(&mut bus, MotorId::new(2).unwrap());
    second.motor_stop().unwrap();

    let ids: Vec<u32> = bus.sent().iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![0x141, 0x142]);
}
