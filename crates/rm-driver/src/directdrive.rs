//! 本末电机
//!
//! 电机对象持有所在总线的句柄：`set` 只把量化后的控制量写入总线暂存区，
//! 真正的发送由 [`DirectDriveBus::flush`] 统一完成，同一半区的 4 台电机合并为一帧。

use crate::DriverError;
use crate::bus::DirectDriveBus;
use crate::config::{ConfigError, DirectDriveConfig};
use rm_can::{BusFrame, RxAdapter, TxAdapter};
use rm_protocol::directdrive::{FeedbackCategory, check_ordinal};
use rm_protocol::{DirectDriveFeedback, Mode, QuantizationTable};
use std::sync::Arc;
use tracing::{debug, trace};

/// 本末电机
pub struct DirectDriveMotor<T: TxAdapter> {
    bus: Arc<DirectDriveBus<T>>,
    id: u8,
    /// 最近一次下发的模式
    mode: Option<Mode>,
    enabled: bool,
    quantization: QuantizationTable,
    feedback: DirectDriveFeedback,
    feedback_frames: u64,
}

impl<T: TxAdapter> std::fmt::Debug for DirectDriveMotor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectDriveMotor")
            .field("bus", &self.bus.name())
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("enabled", &self.enabled)
            .field("feedback", &self.feedback)
            .finish()
    }
}

impl<T: TxAdapter> DirectDriveMotor<T> {
    /// 在总线上挂载 `id` 号电机（1~8）
    pub fn new(bus: Arc<DirectDriveBus<T>>, id: u8) -> Result<Self, DriverError> {
        let id = check_ordinal(id)?;
        bus.attach(id)?;
        Ok(Self {
            bus,
            id,
            mode: None,
            enabled: false,
            quantization: QuantizationTable::default(),
            feedback: DirectDriveFeedback::default(),
            feedback_frames: 0,
        })
    }

    /// 按配置创建电机并下发配置中的工作模式
    ///
    /// `bus` 的名字必须与配置项的总线名一致。
    pub fn from_config(
        bus: Arc<DirectDriveBus<T>>,
        config: &DirectDriveConfig,
        quantization: QuantizationTable,
    ) -> Result<Self, DriverError> {
        if bus.name() != config.bus {
            return Err(ConfigError::UnknownBus {
                bus: config.bus.clone(),
            }
            .into());
        }
        let mut motor = Self::new(bus, config.id)?.with_quantization(quantization);
        motor.set_mode(config.mode)?;
        Ok(motor)
    }

    /// 使用自定义量化表
    pub fn with_quantization(mut self, table: QuantizationTable) -> Self {
        self.quantization = table;
        self
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn bus(&self) -> &Arc<DirectDriveBus<T>> {
        &self.bus
    }

    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 按当前模式设置控制量（超限饱和）
    ///
    /// 从未设置过模式时先把电机切到电流模式。
    pub fn set(&mut self, value: f32) -> Result<(), DriverError> {
        let mode = match self.mode {
            Some(mode) => mode,
            None => {
                self.set_mode(Mode::Current)?;
                Mode::Current
            },
        };
        let raw = self.quantization.quantize(mode, value);
        self.bus.stage(self.id, raw)
    }

    /// 以指定模式设置控制量，模式不同时先切换模式
    pub fn set_with_mode(&mut self, value: f32, mode: Mode) -> Result<(), DriverError> {
        if self.mode != Some(mode) {
            self.set_mode(mode)?;
        }
        self.set(value)
    }

    /// 切换工作模式（立即发送）
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), DriverError> {
        self.bus.set_mode(self.id, mode)?;
        self.mode = Some(mode);
        Ok(())
    }

    /// 使能/失能（立即发送）
    pub fn enable(&mut self, enabled: bool) -> Result<(), DriverError> {
        self.bus.enable(self.id, enabled)?;
        self.enabled = enabled;
        Ok(())
    }

    /// 处理一帧总线数据，返回该帧是否属于本电机
    ///
    /// 只有主反馈类别会更新字段，其他类别识别后忽略。
    pub fn rx_callback(&mut self, frame: &BusFrame) -> bool {
        match FeedbackCategory::classify(frame.id, self.id) {
            Some(FeedbackCategory::Primary) => match DirectDriveFeedback::parse(frame, self.id) {
                Ok(feedback) => {
                    self.feedback = feedback;
                    self.feedback_frames += 1;
                    true
                },
                Err(e) => {
                    debug!("Motor {}: malformed feedback 0x{:X}: {}", self.id, frame.id, e);
                    true
                },
            },
            Some(category) => {
                trace!("Motor {}: ignoring feedback category {:?}", self.id, category);
                true
            },
            None => false,
        }
    }

    pub fn feedback(&self) -> &DirectDriveFeedback {
        &self.feedback
    }

    /// 转速（rpm）
    pub fn rpm(&self) -> f32 {
        self.feedback.rpm
    }

    /// q 轴电流（A）
    pub fn iq(&self) -> f32 {
        self.feedback.iq
    }

    /// 编码器原始值
    pub fn encoder(&self) -> u16 {
        self.feedback.encoder
    }

    /// 母线电压（V）
    pub fn bus_voltage(&self) -> f32 {
        self.feedback.bus_voltage
    }

    /// 已解析的主反馈帧数
    pub fn feedback_frames(&self) -> u64 {
        self.feedback_frames
    }
}

/// 读出总线上所有待处理的帧并交给对应电机，返回被认领的帧数
///
/// `motors` 应为同一条总线上的电机；无人认领的帧丢弃。
pub fn dispatch_feedback<R, T>(
    rx: &mut R,
    motors: &mut [DirectDriveMotor<T>],
) -> Result<usize, DriverError>
where
    R: RxAdapter + ?Sized,
    T: TxAdapter,
{
    let mut claimed = 0;
    while let Some(frame) = rx.try_receive()? {
        if motors.iter_mut().any(|motor| motor.rx_callback(&frame)) {
            claimed += 1;
        } else {
            trace!("Unclaimed bus frame 0x{:X}", frame.id);
        }
    }
    Ok(claimed)
}

impl<T: TxAdapter> Drop for DirectDriveMotor<T> {
    fn drop(&mut self) {
        self.bus.detach(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rm_can::MockCanAdapter;
    use rm_protocol::directdrive::{ID_DRIVE_1234, ID_SET_MODE};

    fn setup() -> (Arc<DirectDriveBus<MockCanAdapter>>, rm_can::SentLog<BusFrame>) {
        let tx = MockCanAdapter::new();
        let sent = tx.sent();
        (Arc::new(DirectDriveBus::new("can0", tx)), sent)
    }

    #[test]
    fn test_new_validates_id() {
        let (bus, _) = setup();
        assert!(DirectDriveMotor::new(bus.clone(), 0).is_err());
        assert!(DirectDriveMotor::new(bus.clone(), 9).is_err());

        let motor = DirectDriveMotor::new(bus.clone(), 4).unwrap();
        assert!(matches!(
            DirectDriveMotor::new(bus.clone(), 4),
            Err(DriverError::MotorAlreadyAttached { id: 4, .. })
        ));
        drop(motor);
        assert!(DirectDriveMotor::new(bus, 4).is_ok());
    }

    #[test]
    fn test_set_defaults_to_current_mode() {
        let (bus, sent) = setup();
        let mut motor = DirectDriveMotor::new(bus.clone(), 2).unwrap();
        assert_eq!(motor.mode(), None);

        motor.set(100.0).unwrap();
        motor.set(100.0).unwrap();
        bus.flush().unwrap();

        let frames = sent.take();
        let ids: Vec<u32> = frames.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![ID_SET_MODE, ID_DRIVE_1234]);
        assert_eq!(frames[0].data[1], u8::from(Mode::Current));
        assert_eq!(&frames[1].data[2..4], &7500i16.to_be_bytes());
        assert_eq!(motor.mode(), Some(Mode::Current));
    }

    #[test]
    fn test_set_fails_when_mode_frame_fails() {
        let tx = MockCanAdapter::new();
        tx.fail_next(1);
        let bus = Arc::new(DirectDriveBus::new("can0", tx));
        let mut motor = DirectDriveMotor::new(bus.clone(), 1).unwrap();

        assert!(matches!(motor.set(1.0), Err(DriverError::Can(_))));
        assert_eq!(motor.mode(), None);
        assert!(!bus.is_dirty(rm_protocol::directdrive::TxHalf::Low));
    }

    #[test]
    fn test_from_config_applies_mode_and_quantization() {
        let (bus, sent) = setup();
        let config = DirectDriveConfig {
            bus: "can0".to_string(),
            id: 7,
            mode: Mode::Speed,
        };
        let mut table = QuantizationTable::default();
        table.get_mut(Mode::Speed).limit = 50.0;

        let mut motor = DirectDriveMotor::from_config(bus.clone(), &config, table).unwrap();
        assert_eq!(motor.mode(), Some(Mode::Speed));
        motor.set(80.0).unwrap();
        bus.flush().unwrap();

        let frames = sent.take();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].id, ID_SET_MODE);
        assert_eq!(frames[0].data[6], u8::from(Mode::Speed));
        assert_eq!(&frames[1].data[4..6], &500i16.to_be_bytes());
    }

    #[test]
    fn test_from_config_rejects_other_bus() {
        let (bus, sent) = setup();
        let config = DirectDriveConfig {
            bus: "can1".to_string(),
            id: 1,
            mode: Mode::Current,
        };
        assert!(matches!(
            DirectDriveMotor::from_config(bus.clone(), &config, QuantizationTable::default()),
            Err(DriverError::Config(ConfigError::UnknownBus { .. }))
        ));
        assert!(sent.is_empty());
        assert!(DirectDriveMotor::new(bus, 1).is_ok());
    }

    #[test]
    fn test_dispatch_feedback_routes_by_address() {
        let (bus, _) = setup();
        let mut rx = MockCanAdapter::new();
        let mut motors = vec![
            DirectDriveMotor::new(bus.clone(), 1).unwrap(),
            DirectDriveMotor::new(bus, 2).unwrap(),
        ];

        rx.queue_frame(BusFrame::new_standard(0x52, &[0x00, 0x0A, 0, 0, 0, 0, 0, 0]));
        rx.queue_frame(BusFrame::new_standard(0x51, &[0x00, 0x14, 0, 0, 0, 0, 0, 0]));
        rx.queue_frame(BusFrame::new_standard(0x200, &[0; 8]));

        assert_eq!(dispatch_feedback(&mut rx, &mut motors).unwrap(), 2);
        assert_eq!(motors[0].rpm(), 2.0);
        assert_eq!(motors[1].rpm(), 1.0);
        assert_eq!(dispatch_feedback(&mut rx, &mut motors).unwrap(), 0);
    }

    #[test]
    fn test_set_with_mode_switches_once() {
        let (bus, sent) = setup();
        let mut motor = DirectDriveMotor::new(bus.clone(), 1).unwrap();

        motor.set_with_mode(12.3, Mode::Speed).unwrap();
        motor.set_with_mode(-12.3, Mode::Speed).unwrap();
        bus.flush().unwrap();

        let frames = sent.take();
        let ids: Vec<u32> = frames.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![ID_SET_MODE, ID_DRIVE_1234]);
        assert_eq!(frames[0].data[0], u8::from(Mode::Speed));
        assert_eq!(&frames[1].data[0..2], &(-123i16).to_be_bytes());
        assert_eq!(motor.mode(), Some(Mode::Speed));
    }

    #[test]
    fn test_custom_quantization() {
        let (bus, sent) = setup();
        let mut table = QuantizationTable::default();
        table.get_mut(Mode::Current).limit = 10.0;
        let mut motor = DirectDriveMotor::new(bus.clone(), 5).unwrap().with_quantization(table);

        motor.set(50.0).unwrap();
        bus.flush().unwrap();
        assert_eq!(&sent.take()[1].data[0..2], &1000i16.to_be_bytes());
    }

    #[test]
    fn test_rx_callback_updates_primary_feedback() {
        let (bus, _) = setup();
        let mut motor = DirectDriveMotor::new(bus, 3).unwrap();

        let frame = BusFrame::new_standard(0x53, &[0x03, 0xE8, 0xFF, 0x9C, 0x12, 0x34, 0x00, 0xF1]);
        assert!(motor.rx_callback(&frame));
        assert_eq!(motor.rpm(), 100.0);
        assert_eq!(motor.iq(), -1.0);
        assert_eq!(motor.encoder(), 0x1234);
        assert!((motor.bus_voltage() - 24.1).abs() < 1e-4);
        assert_eq!(motor.feedback_frames(), 1);
    }

    #[test]
    fn test_rx_callback_ignores_other_addresses() {
        let (bus, _) = setup();
        let mut motor = DirectDriveMotor::new(bus, 3).unwrap();
        let before = *motor.feedback();

        assert!(!motor.rx_callback(&BusFrame::new_standard(0x54, &[0xFF; 8])));
        assert!(motor.rx_callback(&BusFrame::new_standard(0x63, &[0xFF; 8])));
        assert_eq!(*motor.feedback(), before);
        assert_eq!(motor.feedback_frames(), 0);
    }

    #[test]
    fn test_enable_tracks_state() {
        let (bus, sent) = setup();
        let mut motor = DirectDriveMotor::new(bus, 6).unwrap();
        motor.enable(true).unwrap();
        assert!(motor.is_enabled());
        assert_eq!(sent.take()[0].data[5], 0x02);
    }
}
