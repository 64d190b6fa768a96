//! 宇树电机
//!
//! 点对点串口链路：每个控制周期编码一帧 34 字节命令并写出，
//! 接收到的 78 字节遥测帧整帧校验通过后才更新反馈。

use crate::DriverError;
use crate::config::UnitreeConfig;
use rm_can::SerialTx;
use rm_protocol::unitree::{COMMAND_LEN, check_motor_id, encode_command};
use rm_protocol::{ControlParam, UnitreeFeedback, UnitreeMode};
use tracing::{debug, info, warn};

/// 宇树电机
pub struct UnitreeMotor<S: SerialTx> {
    serial: S,
    id: u8,
    mode: UnitreeMode,
    param: ControlParam,
    tx_buffer: [u8; COMMAND_LEN],
    feedback: Option<UnitreeFeedback>,
    rx_rejected: u64,
}

impl<S: SerialTx> std::fmt::Debug for UnitreeMotor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitreeMotor")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("param", &self.param)
            .field("feedback", &self.feedback)
            .finish_non_exhaustive()
    }
}

impl<S: SerialTx> UnitreeMotor<S> {
    pub fn new(serial: S, id: u8) -> Result<Self, DriverError> {
        let id = check_motor_id(id)?;
        info!("Unitree motor {} created", id);
        let mode = UnitreeMode::default();
        let param = ControlParam::default();
        Ok(Self {
            serial,
            id,
            mode,
            param,
            tx_buffer: encode_command(id, mode, &param),
            feedback: None,
            rx_rejected: 0,
        })
    }

    /// 按配置创建，使用配置中的控制模式
    pub fn from_config(serial: S, config: &UnitreeConfig) -> Result<Self, DriverError> {
        let mut motor = Self::new(serial, config.id)?;
        motor.set_mode(config.mode);
        Ok(motor)
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn mode(&self) -> UnitreeMode {
        self.mode
    }

    pub fn param(&self) -> &ControlParam {
        &self.param
    }

    /// 纯力矩控制（其余参数清零）
    pub fn set_tau(&mut self, tau: f32) {
        self.set_param(ControlParam::torque(tau));
    }

    /// 设置混合控制参数
    pub fn set_param(&mut self, param: ControlParam) {
        self.param = param;
        self.tx_buffer = encode_command(self.id, self.mode, &self.param);
    }

    pub fn set_mode(&mut self, mode: UnitreeMode) {
        self.mode = mode;
        self.tx_buffer = encode_command(self.id, self.mode, &self.param);
    }

    /// 待发送的命令帧
    pub fn tx_buffer(&self) -> &[u8; COMMAND_LEN] {
        &self.tx_buffer
    }

    /// 写出当前命令帧
    pub fn send_command(&mut self) -> Result<(), DriverError> {
        self.serial.write(&self.tx_buffer).map_err(|e| {
            warn!("Unitree motor {}: command write failed: {}", self.id, e);
            DriverError::from(e)
        })
    }

    /// 处理一帧遥测，校验失败时反馈保持不变
    pub fn rx_callback(&mut self, bytes: &[u8]) -> Result<(), DriverError> {
        match UnitreeFeedback::decode(bytes, self.id) {
            Ok(feedback) => {
                self.feedback = Some(feedback);
                Ok(())
            },
            Err(e) => {
                self.rx_rejected += 1;
                debug!("Unitree motor {}: telemetry dropped: {}", self.id, e);
                Err(e.into())
            },
        }
    }

    /// 最近一次有效遥测
    pub fn feedback(&self) -> Option<&UnitreeFeedback> {
        self.feedback.as_ref()
    }

    /// 当前力矩（N·m），尚无遥测时为 0
    pub fn torque(&self) -> f32 {
        self.feedback.map_or(0.0, |f| f.torque)
    }

    /// 当前速度（rad/s）
    pub fn velocity(&self) -> f32 {
        self.feedback.map_or(0.0, |f| f.velocity)
    }

    /// 当前位置（rad）
    pub fn position(&self) -> f32 {
        self.feedback.map_or(0.0, |f| f.position)
    }

    /// 温度（℃）
    pub fn temperature(&self) -> i8 {
        self.feedback.map_or(0, |f| f.temperature)
    }

    /// 被丢弃的遥测帧数
    pub fn rx_rejected(&self) -> u64 {
        self.rx_rejected
    }
}
