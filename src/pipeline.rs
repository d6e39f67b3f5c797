//! The merge pipeline: load, plan, stamp, write
//!
//! A merge is all-or-nothing. Any failure before or during writing leaves no
//! output file, and the inputs are only ever read.
//!
//! # Example
//!
//! ```no_run
//! use pdf_report_merger::pipeline::{MergePipeline, MergeRequest};
//!
//! let request = MergeRequest::new(
//!     "report.pdf",
//!     vec!["trial-a.pdf".into(), "trial-b.pdf".into()],
//!     "Field Trials 2024",
//!     "report_WithCovers.pdf",
//! );
//! let summary = MergePipeline::new(request).run().expect("merge failed");
//! println!("{} pages", summary.total_pages);
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lopdf::ObjectId;
use tracing::{debug, error, info, instrument};

use crate::error::{Error, ErrorKind, Result};
use crate::layout::{CoverStyle, FooterStyle, PaperSize};
use crate::pdf::assemble::Assembler;
use crate::pdf::cover::CoverPageGenerator;
use crate::pdf::font::encode_win_ansi;
use crate::pdf::footer::{FooterSpec, FooterStamper};
use crate::pdf::source::SourceDocument;
use crate::pdf::writer::{write_document, DocumentMetadata};
use crate::plan::{MergePlan, PlanEntry, SourceRef, TrialPages};

/// Everything the presentation shell supplies for one merge
#[derive(Debug, Clone)]
pub struct MergeRequest {
    /// Main report, placed first
    pub main: PathBuf,
    /// Trial reports in the order chosen by the user
    pub trials: Vec<PathBuf>,
    /// Footer title; may be empty
    pub report_title: String,
    /// Destination, replaced if it exists
    pub output: PathBuf,
    /// Cover size when the main document has no pages
    pub cover_fallback: PaperSize,
    pub footer_style: FooterStyle,
    pub cover_style: CoverStyle,
}

impl MergeRequest {
    pub fn new(
        main: impl Into<PathBuf>,
        trials: Vec<PathBuf>,
        report_title: impl Into<String>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            main: main.into(),
            trials,
            report_title: report_title.into(),
            output: output.into(),
            cover_fallback: PaperSize::default(),
            footer_style: FooterStyle::default(),
            cover_style: CoverStyle::default(),
        }
    }

    /// `<main stem>_WithCovers.pdf` next to the main document
    pub fn default_output_for(main: &Path) -> PathBuf {
        let stem = main
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "merged".to_string());
        main.with_file_name(format!("{stem}_WithCovers.pdf"))
    }

    fn inputs(&self) -> impl Iterator<Item = &PathBuf> {
        std::iter::once(&self.main).chain(self.trials.iter())
    }

    fn validate(&self) -> Result<()> {
        if let Err(c) = encode_win_ansi(&self.report_title) {
            return Err(Error::InvalidRequest(format!(
                "report title contains {c:?}, which Helvetica cannot show"
            )));
        }
        let output = comparable(&self.output);
        if let Some(input) = self.inputs().find(|p| comparable(p) == output) {
            return Err(Error::InvalidRequest(format!(
                "output {} would overwrite an input",
                input.display()
            )));
        }
        Ok(())
    }
}

fn comparable(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    LoadingInputs,
    BuildingPlan,
    Stamping,
    Writing,
    Done,
    Failed,
}

/// Result of a successful merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    pub total_pages: usize,
    pub output: PathBuf,
    /// 1-based cover page numbers, in trial order
    pub cover_positions: Vec<usize>,
    pub bytes_written: u64,
}

/// Final status handed back to the presentation shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeStatus {
    Done { total_pages: usize },
    Failed { kind: ErrorKind, message: String },
}

/// Called with `(page_number, total_pages)` after each page is stamped
type ProgressFn = Box<dyn FnMut(usize, usize) + Send>;

/// One merge invocation; owns its documents exclusively
pub struct MergePipeline {
    request: MergeRequest,
    stage: Stage,
    cancel: Option<Arc<AtomicBool>>,
    progress: Option<ProgressFn>,
}

impl fmt::Debug for MergePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergePipeline")
            .field("request", &self.request)
            .field("stage", &self.stage)
            .field("cancel", &self.cancel)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl MergePipeline {
    pub fn new(request: MergeRequest) -> Self {
        Self {
            request,
            stage: Stage::Idle,
            cancel: None,
            progress: None,
        }
    }

    /// Stop at the next stage or page boundary once `flag` is set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Report stamping progress, e.g. to drive a progress bar
    pub fn on_page_stamped(mut self, progress: impl FnMut(usize, usize) + Send + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn request(&self) -> &MergeRequest {
        &self.request
    }

    /// Run the merge to completion; may only be called once
    #[instrument(skip_all, fields(main = %self.request.main.display(), trials = self.request.trials.len()))]
    pub fn run(&mut self) -> Result<MergeSummary> {
        if self.stage != Stage::Idle {
            return Err(Error::InvalidRequest(format!(
                "pipeline already ran (stage {:?})",
                self.stage
            )));
        }

        match self.run_stages() {
            Ok(summary) => {
                self.stage = Stage::Done;
                info!(total_pages = summary.total_pages, output = %summary.output.display(), "merge complete");
                Ok(summary)
            }
            Err(e) => {
                error!(stage = ?self.stage, error = %e, "merge failed");
                self.stage = Stage::Failed;
                Err(e)
            }
        }
    }

    /// Run and reduce the outcome to a status for display
    pub fn execute(mut self) -> MergeStatus {
        match self.run() {
            Ok(summary) => MergeStatus::Done {
                total_pages: summary.total_pages,
            },
            Err(e) => MergeStatus::Failed {
                kind: e.kind(),
                message: e.to_string(),
            },
        }
    }

    fn enter(&mut self, stage: Stage) -> Result<()> {
        self.check_cancelled()?;
        debug!(from = ?self.stage, to = ?stage, "stage transition");
        self.stage = stage;
        Ok(())
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::SeqCst) => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }

    fn run_stages(&mut self) -> Result<MergeSummary> {
        self.request.validate()?;

        self.enter(Stage::LoadingInputs)?;
        let inputs = LoadedInputs::load(&self.request)?;

        self.enter(Stage::BuildingPlan)?;
        let plan = inputs.plan();
        if plan.is_empty() {
            return Err(Error::EmptyMerge(self.request.main.clone()));
        }
        let total_pages = plan.total_pages();
        info!(total_pages, covers = plan.cover_positions().len(), "built merge plan");

        let cover_size = match inputs.main.first_page_size() {
            Some(size) => size,
            None => {
                info!(fallback = ?self.request.cover_fallback, "main document is empty, using fallback cover size");
                self.request.cover_fallback.size()
            }
        };

        let mut assembler = Assembler::new();
        let main_pages = assembler.import(inputs.main)?;
        let mut trial_pages = Vec::with_capacity(inputs.trials.len());
        for trial in inputs.trials {
            trial_pages.push(assembler.import(trial)?);
        }

        let mut covers = CoverPageGenerator::new(cover_size, self.request.cover_style);
        let mut page_ids: Vec<ObjectId> = Vec::with_capacity(total_pages);
        for (number, entry) in plan.numbered() {
            let page_id = match entry {
                PlanEntry::Original { source: SourceRef::Main, index } => main_pages[*index],
                PlanEntry::Original { source: SourceRef::Trial(t), index } => trial_pages[*t][*index],
                PlanEntry::Cover { label, .. } => {
                    covers.generate(assembler.document_mut(), label)?.page_id
                }
            };
            debug!(page = number, ?entry, "placed page");
            page_ids.push(page_id);
        }

        self.enter(Stage::Stamping)?;
        let mut stamper = FooterStamper::new(self.request.footer_style);
        for (number, &page_id) in (1..=total_pages).zip(page_ids.iter()) {
            self.check_cancelled()?;
            let spec = FooterSpec::new(self.request.report_title.clone(), number, total_pages)?;
            stamper.stamp(assembler.document_mut(), page_id, &spec)?;
            if let Some(progress) = self.progress.as_mut() {
                progress(number, total_pages);
            }
        }
        let mut doc = assembler.finish(&page_ids)?;

        self.enter(Stage::Writing)?;
        let metadata = DocumentMetadata {
            title: self.request.report_title.clone(),
            producer: concat!("pdf-report-merger ", env!("CARGO_PKG_VERSION")).to_string(),
        };
        let bytes_written = write_document(&mut doc, &self.request.output, &metadata)?;

        Ok(MergeSummary {
            total_pages,
            output: self.request.output.clone(),
            cover_positions: plan.cover_positions().to_vec(),
            bytes_written,
        })
    }
}

/// Every input opened, in user order
struct LoadedInputs {
    main: SourceDocument,
    trials: Vec<SourceDocument>,
}

impl LoadedInputs {
    fn load(request: &MergeRequest) -> Result<Self> {
        let main = SourceDocument::open(&request.main, SourceRef::Main)?;
        let trials = request
            .trials
            .iter()
            .enumerate()
            .map(|(i, path)| SourceDocument::open(path, SourceRef::Trial(i)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { main, trials })
    }

    fn plan(&self) -> MergePlan {
        let trials: Vec<TrialPages> = self
            .trials
            .iter()
            .map(|t| TrialPages::new(t.label(), t.page_count()))
            .collect();
        MergePlan::build(self.main.page_count(), &trials)
    }
}

/// Load the inputs and return the plan without writing anything
pub fn plan_only(request: &MergeRequest) -> Result<MergePlan> {
    Ok(LoadedInputs::load(request)?.plan())
}
