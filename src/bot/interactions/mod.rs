pub mod status_buttons;
