//! Face descriptor matching and enrollment.

pub mod descriptor;
pub mod enrollment;
pub mod matcher;
pub mod service;

pub use descriptor::{Descriptor, DescriptorError};
pub use enrollment::EnrollmentGuard;
pub use matcher::{
    Anomaly, LinearScan, MatchOutcome, Matcher, Nearest, NearestNeighbor, Scan,
    DEFAULT_MATCH_THRESHOLD,
};
pub use service::{Authenticated, FaceAuth};
