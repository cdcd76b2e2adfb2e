/// Common data types for hardware abstraction interfaces
pub use nalgebra::Vector3;

/// 3D vector representation using nalgebra
pub type Vector3d = Vector3<f64>;
