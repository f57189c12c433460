//! Outbound status and tick source traits

use g86_protocol::Publication;

use crate::timer::TimerId;

/// Queue for outbound timer publications
///
/// Implementations must not block: the tick path calls this every 100 ms.
/// A full or offline queue drops the publication.
pub trait PublishOutbox {
    fn publish(&mut self, publication: Publication);
}

/// Periodic tick source per timer
pub trait TickRegistry {
    /// Begin ticking `timer` every 10 ms
    fn register(&mut self, timer: TimerId);

    /// Stop ticking `timer`
    fn deregister(&mut self, timer: TimerId);
}
