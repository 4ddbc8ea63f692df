pub mod appearance_tab;
pub mod player_tab;
pub mod settings_tab;
