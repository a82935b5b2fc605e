#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Burn distributed data samplers.

extern crate alloc;

mod config;
mod error;
mod group;
mod plan;
mod policy;
mod sampler;

pub use config::*;
pub use error::*;
pub use group::*;
pub use plan::*;
pub use policy::*;
pub use sampler::*;
