#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Connect,
    Browse,
}

/// Which browse region receives key input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrowseFocus {
    Sidebar,
    Content,
}
