/// This module contains the batch database model.
pub mod batch;

/// This module contains the event database model.
pub mod event;

/// This module contains the fork id database model.
pub mod fork_id;
