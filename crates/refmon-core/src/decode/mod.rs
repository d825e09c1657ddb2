//! Frame layouts of the two sensor boards

mod adc;
mod infrared;

pub use adc::{
    apply_slot_swaps, parse_adc_code, remap_slots, AdcLayout, ADC_MAPPED_CHANNELS, ADC_SLOTS,
    REMAP_BLOCKS, REMAP_BLOCK_LEN, SLOT_SWAPS,
};
pub use infrared::{parse_infrared_slot, InfraredLayout, INFRARED_SLOTS};
