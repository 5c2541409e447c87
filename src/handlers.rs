pub mod health;
pub mod historico;
pub mod leads;
