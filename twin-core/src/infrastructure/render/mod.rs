pub mod guide;

pub use guide::{AI_GUIDE, GuideRenderer, ROOT_README};
