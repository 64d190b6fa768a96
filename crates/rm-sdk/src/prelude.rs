//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use rm_sdk::prelude::*;
//! ```

// 驱动层
pub use crate::driver::{
    AnyRefereeLink, CommConfig, DirectDriveBus, DirectDriveMotor, RefereeLink, RefereeReader,
    RefereeRevision, UnitreeMotor, dispatch_feedback, flush_all,
};

// 协议层
pub use crate::protocol::referee::{FrameDecoder, V164, V170};
pub use crate::protocol::{ControlParam, Mode, QuantizationTable, UnitreeMode};

// 传输层（常用 Trait）
pub use crate::can::{BusFrame, RxAdapter, SerialTx, TxAdapter};

// 错误类型
pub use crate::can::CanError;
pub use crate::driver::DriverError;
pub use crate::protocol::ProtocolError;
