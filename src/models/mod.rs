//! Data models for vidacquire.

mod continuation;
mod crawl;
mod item;

pub use continuation::{CommentSession, Continuation, SortMode};
pub use crawl::{CrawlFailure, CrawlJob, CrawlResult, CrawlStats, ItemBatch, JobKind};
pub use item::{
    ChannelVideoRef, Comment, Item, LiveChatMessage, PlaylistVideoRef, Video, VideoFormat,
};
