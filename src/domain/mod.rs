// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// - order/   Order aggregate and the lifecycle engine (command handler)
// - access     Roles and the single authorization policy
// - cart       Per-customer basket ahead of placement
// - catalog    Product, referenced by order lines
// - dashboard  Admin counts and revenue
// - user       Users, referenced as customers, agents and admins
//
// This layer knows nothing about HTTP or the concrete stores.
//
// ============================================================================

pub mod access;
pub mod cart;
pub mod catalog;
pub mod dashboard;
pub mod order;
pub mod user;
