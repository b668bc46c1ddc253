//! Graph analysis beyond generation and layout.
//!
//! | Module | Question answered |
//! |--------|-------------------|
//! | [`spectral`] | How many latent groups does the adjacency spectrum support? |

pub mod spectral;

pub use spectral::{embedding_dimension, polarization, singular_values};
