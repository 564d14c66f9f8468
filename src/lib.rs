//! Latent Dirichlet Allocation topic models trained with collapsed Gibbs sampling.
//!
//! The crate is organized leaves first:
//!
//! - [`distributions`]: inverse-CDF draws from un-normalized weights.
//! - [`document`]: documents, corpora and the occurrence cursor.
//! - [`model`]: word-topic count tables, accumulation and persistence.
//! - [`gibbs`]: the sampler, document and corpus sweeps, log-likelihood.
//! - [`train`]: the training loop used by the `gibbs-lda` binary.
pub mod distributions;
pub mod document;
pub mod error;
pub mod gibbs;
pub mod io;
pub mod model;
pub mod train;

pub use document::{Corpus, Document, WordCursor};
pub use error::{LdaError, Result};
pub use gibbs::Sampler;
pub use model::Model;
