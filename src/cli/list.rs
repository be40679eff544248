//! List command handler.

use color_eyre::Result;

use crate::migrations::create_register;

use super::App;

impl App {
    /// Print every registered migration with its description.
    pub fn run_list(&self) -> Result<()> {
        for migration in create_register().iter() {
            println!("{}  {}", migration.id(), migration.description());
        }
        Ok(())
    }
}
