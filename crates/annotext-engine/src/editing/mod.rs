/*!
 * # Editing Core Module
 *
 * The document model, the elementary edits it accepts, and the policy that
 * decides which edits are allowed in which mode.
 *
 * ## Architecture Overview
 *
 * ### 1. Positions
 * - The document is a tree of blocks; every textblock holds text runs carrying a `MarkSet`
 * - Each character is one position, and every non-leaf element below the root
 *   adds one position before and one after its content
 * - In `<p>Hello world</p>` the word "Hello" spans `1..6`
 *
 * ### 2. Command-Based Editing
 * - User-level edits are **Commands** (`Cmd` enum) compiled into a **Transaction**
 * - A transaction is an ordered list of **Steps**, a closed enum of elementary changes
 * - `Document::apply` runs all steps on a copy and commits only if all succeed
 *
 * ### 3. Mode Guard
 * - `filter_transaction` classifies every step by `StepKind` and accepts or
 *   rejects the transaction as a whole for the current `Mode`
 * - It is a pure predicate and never touches the document
 *
 * ### 4. Comment Ranges
 * - Comment ranges are derived from the text runs on demand, never stored
 * - `comment_range_at`, `comment_range_for_id` and `comment_ranges` scan the
 *   document and expand across adjacent runs carrying the same comment id
 *
 * ## Module Structure
 *
 * - **`document`**: `Document`, position resolution and atomic `apply`
 * - **`transaction`**: `Step`, `StepKind` and `Transaction`
 * - **`commands`**: `Cmd` enum and its compilation into transactions
 * - **`ranges`**: comment range resolution and navigation
 * - **`guard`**: `Mode`, `Rejection` and `filter_transaction`
 * - **`patch`**: edit result metadata including changed ranges and new selection
 *
 * ## Usage Pattern
 *
 * ```rust
 * use annotext_engine::editing::*;
 *
 * let mut doc = Document::from_text("Hello world");
 *
 * let tr = compile_command(&doc, &Cmd::SetComment {
 *     range: 1..6,
 *     id: "c1".to_string(),
 *     text: "note".to_string(),
 * }).unwrap();
 *
 * // Teachers may comment, students may not
 * assert!(filter_transaction(Mode::TeacherComment, &tr).is_ok());
 * assert!(filter_transaction(Mode::StudentInput, &tr).is_err());
 *
 * doc.apply(&tr).unwrap();
 * let ranges = doc.comment_ranges();
 * assert_eq!((ranges[0].from, ranges[0].to), (1, 6));
 * ```
 */

pub mod commands;
pub mod document;
pub mod guard;
pub(crate) mod inline;
pub mod patch;
pub mod ranges;
pub mod transaction;

// Public API re-exports
pub use commands::{Cmd, compile_command};
pub use document::{Document, EditError};
pub use guard::{Mode, ParseModeError, Rejection, filter_transaction};
pub use patch::Patch;
pub use ranges::{CommentRange, next_comment, prev_comment};
pub use transaction::{Step, StepKind, Transaction};
