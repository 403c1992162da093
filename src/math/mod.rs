pub mod trs;
