//! Candidate correspondence ranking.
//!
//! Holds the bounded Top-K collector used to keep the most confident matches.

pub(crate) mod topk;
