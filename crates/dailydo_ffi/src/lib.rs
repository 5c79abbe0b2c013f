//! Flutter-facing bindings for `dailydo_core`.

pub mod api;
