//! The poll aggregate.
//!
//! A poll and all its options and votes are read, validated and written as one
//! unit. Every operation takes a snapshot and returns a new value or a
//! [`PollError`]; persistence and concurrency control belong to the caller.

mod aggregate;
mod document;
mod error;

pub use aggregate::{NewPoll, Poll, PollOption, PollParts, PollStatus, PollVote};
pub use document::{
    EntityRef, Identified, PollDocument, PollOptionDocument, PollVoteDocument, RestaurantRef,
    UserRef,
};
pub use error::PollError;
