pub mod effect_panel;
pub mod frequency_chart;
pub mod input_select;
pub mod rotary_encoder;
pub mod setup_dialog;
