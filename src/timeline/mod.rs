//! Integer timing for looping assets: shared tick rate, composite period and change instants.

pub(crate) mod clock;
pub(crate) mod events;
pub(crate) mod timebase;
