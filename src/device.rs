//! The device-session API: the connection state machine, its command queue,
//! timers, and the transport port abstraction.
//! 设备会话API：连接状态机、命令队列、定时器与传输端口抽象。

pub mod actor;
pub mod command_queue;
pub mod event;
pub mod handler;
pub mod port;
pub mod retry;
pub mod state;
pub mod timing;

pub use actor::{DeviceHandle, DeviceSession};
pub use command_queue::CommandQueue;
pub use event::DeviceEvent;
pub use handler::DeviceHandler;
pub use port::{ThermostatPort, ThermostatUpdateListener};
pub use state::{ConnectionState, DeviceStatus};
