//! TUI controller: modal keystroke handling, pagination-aware rendering
//! inputs, and search across blocks (§4.6).

pub mod dispatcher;
pub mod ex;
pub mod menu;
pub mod mode;
pub mod ruler;
pub mod search;

pub use dispatcher::{handle_key, Action, UiState};
pub use ex::{parse_ex_command, ExCommand};
pub use menu::Menu;
pub use mode::Mode;
pub use ruler::ruler_text;
pub use search::{find_block, find_matches, preview, search_next, search_prev, SearchPreview};
