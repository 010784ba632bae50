//! src/config.rs
//!
//! 负责加载运行配置并提供几套有代表性的天赋预设。
//! config.json 存在时按字段覆盖默认配置，不存在时直接使用基准默认值。

use crate::models::Settings;
use std::fs;
use std::path::PathBuf;

pub fn load_settings() -> Result<Settings, Box<dyn std::error::Error>> {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let config_path = manifest_dir.join("config.json");
    if !config_path.exists() {
        return Ok(Settings::default());
    }
    let settings: Settings = serde_json::from_str(&fs::read_to_string(config_path)?)?;
    Ok(settings)
}

/// 没有任何天赋投入的白板基准：所有加成关闭、所有百分比清零。
pub fn no_atlas_settings() -> Settings {
    Settings {
        bumper_crop: false,
        bountiful_harvest: false,
        heart_of_the_grove: false,
        doubling_season: false,
        crop_rotation: false,
        increased_t3_crop_chance: 0,
        increased_quantity_of_lifeforce: 0,
        duplicated_monsters_chance: 0,
        additional_sacred_grove_chance: 0,
        additional_extra_content_chance: 0,
        reduced_blue_chance: 0,
        reduced_purple_chance: 0,
        reduced_yellow_chance: 0,
        increased_quantity: 0,
        increased_map_modifier_effect: 0,
        stream_of_consciousness: false,
        ..Settings::default()
    }
}

/// 常规天赋树：拿满 Harvest 相关的关键点与小点。
pub fn regular_atlas_settings() -> Settings {
    Settings {
        reduced_blue_chance: 45,
        reduced_purple_chance: 45,
        reduced_yellow_chance: 0,
        bumper_crop: true,
        bountiful_harvest: true,
        heart_of_the_grove: true,
        doubling_season: true,
        increased_t3_crop_chance: 30,
        increased_quantity_of_lifeforce: 18,
        duplicated_monsters_chance: 6,
        additional_sacred_grove_chance: 45,
        additional_extra_content_chance: 14,
        increased_quantity: 15,
        increased_map_modifier_effect: 30,
        increased_pack_size: 0,
        stream_of_consciousness: true,
        ..Settings::default()
    }
}

/// Grand Design：小点全部失效，换来每个关键天赋 1% 怪物群规模。
pub fn grand_design_atlas_settings() -> Settings {
    Settings {
        bumper_crop: true,
        bountiful_harvest: true,
        heart_of_the_grove: true,
        doubling_season: true,
        increased_t3_crop_chance: 0,
        increased_quantity_of_lifeforce: 0,
        duplicated_monsters_chance: 0,
        additional_sacred_grove_chance: 15,
        additional_extra_content_chance: 8,
        reduced_blue_chance: 25,
        reduced_purple_chance: 25,
        reduced_yellow_chance: 0,
        increased_quantity: 0,
        increased_map_modifier_effect: 0,
        increased_pack_size: 40,
        stream_of_consciousness: true,
        ..Settings::default()
    }
}

/// Wandering Path：关键天赋失效，小点效果翻倍。
pub fn wandering_path_atlas_settings() -> Settings {
    Settings {
        bumper_crop: false,
        bountiful_harvest: false,
        heart_of_the_grove: false,
        doubling_season: false,
        increased_t3_crop_chance: 60,
        increased_quantity_of_lifeforce: 36,
        duplicated_monsters_chance: 12,
        additional_sacred_grove_chance: 60,
        additional_extra_content_chance: 0,
        reduced_blue_chance: 40,
        reduced_purple_chance: 40,
        reduced_yellow_chance: 0,
        increased_quantity: 30,
        increased_map_modifier_effect: 60,
        stream_of_consciousness: true,
        ..Settings::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_atlas_settings_clears_all_bonuses() {
        let settings = no_atlas_settings();
        assert!(!settings.bumper_crop);
        assert!(!settings.heart_of_the_grove);
        assert!(!settings.doubling_season);
        assert!(!settings.stream_of_consciousness);
        assert_eq!(settings.increased_t3_crop_chance, 0);
        assert_eq!(settings.increased_map_modifier_effect, 0);
        assert_eq!(settings.reduced_blue_chance, 0);
        // 实测参数不属于天赋加成，保持默认
        assert_eq!(settings.t2_binom_n, 8);
    }

    #[test]
    fn test_atlas_presets_match_tree_tradeoffs() {
        let wandering = wandering_path_atlas_settings();
        assert!(!wandering.bumper_crop);
        assert_eq!(wandering.increased_map_modifier_effect, 60);
        assert_eq!(wandering.increased_t3_crop_chance, 60);

        let grand = grand_design_atlas_settings();
        assert!(grand.bumper_crop);
        assert_eq!(grand.increased_t3_crop_chance, 0);
        assert_eq!(grand.increased_pack_size, 40);

        let regular = regular_atlas_settings();
        assert_eq!(regular.increased_t3_crop_chance, 30);
        assert_eq!(regular.reduced_blue_chance, 45);
    }
}
