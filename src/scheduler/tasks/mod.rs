pub mod draft_pruner;
