// NMF topic analysis over a corpus of social-media posts.
//
// Pipeline order: corpus -> vectorizer -> nmf -> analysis -> report.
// topic_modeling wires the first four together for a batch run.

pub mod analysis;
pub mod config;
pub mod corpus;
pub mod error;
pub mod models;
pub mod nmf;
pub mod report;
pub mod topic_modeling;
pub mod vectorizer;

pub use error::{Result, TopicError};
