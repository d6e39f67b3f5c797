//! PDF Report Merger Library
//!
//! Combines a main report PDF with any number of trial PDFs into one
//! document. This library provides functionality to:
//! - Insert a generated cover page before each trial
//! - Stamp every page with a footer carrying the report title and "Page k of N"
//! - Plan a merge without writing anything
//! - Write the result atomically, leaving no partial output on failure
//!
//! # Example
//!
//! ```no_run
//! use pdf_report_merger::pipeline::{MergePipeline, MergeRequest};
//! use std::path::PathBuf;
//!
//! let request = MergeRequest::new(
//!     "Annual Report.pdf",
//!     vec![PathBuf::from("Trial A.pdf"), PathBuf::from("Trial B.pdf")],
//!     "Annual Report 2024",
//!     "Annual Report_WithCovers.pdf",
//! );
//!
//! MergePipeline::new(request).run().expect("Failed to merge PDFs");
//! ```

pub mod error;
pub mod layout;
pub mod pdf;
pub mod pipeline;
pub mod plan;

// Re-export commonly used items
pub use error::{Error, ErrorKind, Result};
pub use pipeline::{plan_only, MergePipeline, MergeRequest, MergeStatus, MergeSummary, Stage};
pub use plan::{MergePlan, PlanEntry, SourceRef};
