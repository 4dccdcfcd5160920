// Domain models

mod alert;
mod container;
mod network;
mod storage;
mod summary;
mod system;

pub use alert::{AlertLevel, AlertRecord, ResourceType};
pub use container::ContainerSnapshot;
pub use network::NetworkSnapshot;
pub use storage::DiskSnapshot;
pub use summary::{Anomaly, Insights, Recommendation, Summary, TrafficMb};
pub use system::{CpuSnapshot, MemorySnapshot, Sample, SystemDescriptor};
