pub mod inventory_audit;
