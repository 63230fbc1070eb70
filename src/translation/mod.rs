/*!
 * Structure-preserving document translation.
 *
 * - `core`: the translation port with its fallback policy
 * - `format`: copies of cell formatting, column layout and shape structure
 * - `walker`: spreadsheet and presentation tree walkers
 * - `pipeline`: read → walk → write driver
 */

// Re-export main types for easier usage
pub use self::core::{TranslationOptions, TranslationRequest, TranslationResult, TranslationStats, Translator};
pub use self::pipeline::{DocumentPipeline, PipelineState};
pub use self::walker::{DocumentWalker, PresentationWalker, ProgressCallback, SpreadsheetWalker};

// Submodules
pub mod core;
pub mod format;
pub mod pipeline;
pub mod walker;
