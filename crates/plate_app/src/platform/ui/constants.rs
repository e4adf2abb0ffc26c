pub const CMD_ANALYZE: &str = "analyze";
pub const CMD_BACK: &str = "back";
pub const CMD_NEW: &str = "new";
pub const CMD_QUIT: &str = "quit";

pub const PROGRESS_BAR_WIDTH: usize = 20;
