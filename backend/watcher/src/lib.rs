//! `codeferry-watcher`: keeps watching one page, delivering new code blocks
//! and answering user actions.

pub mod action;
pub mod chord;
pub mod source;
pub mod watcher;

pub use action::{AffordanceId, ListedAffordance, Mutation, UserAction};
pub use chord::KeyChord;
pub use source::{PageSnapshot, PageSource};
pub use watcher::{
    watch_channels, WatchChannels, WatchInputs, WatchState, Watcher, WatcherSettings,
    NO_BLOCKS_MESSAGE, NO_CODE_MESSAGE, SUCCESS_MESSAGE,
};
