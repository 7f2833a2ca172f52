pub use crate::base::{
    config::Config,
    error::{ClassifyError, ClassifyRes, ErrorKind},
    types::{CategoryNode, CategoryPath, ClassificationResult, Err, Res, Void},
};
pub use crate::pipeline::ClassifyJob;
pub use anyhow::anyhow;
pub use tracing::{debug, error, info, instrument, warn};
