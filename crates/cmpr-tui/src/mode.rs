//! The four modes the controller can be in (§4.6).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Search,
    Ex,
    Menu,
}
