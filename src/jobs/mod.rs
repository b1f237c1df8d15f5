mod pdf;

pub use pdf::{JobHandle, PdfSummaryJob, PdfSummaryLauncher};
