//! src/models.rs
//!
//! 定义了程序中所有核心的数据结构。

use serde::Deserialize;
use std::cmp::Ordering;
use std::fmt;

use crate::utils;

/// 每块田固定的植物总数。T1 数量不单独存储，由 23 减去高阶种子数得出。
pub const PLANTS_PER_PLOT: u32 = 23;

/// Heart of the Grove 天赋下，未被选中的地块有 10% 概率不枯萎而保留下来。
pub const NO_WILT_CHANCE: f64 = 0.1;

/// 地块颜色。比较与排序依据显式的 rank 表（NONE < YELLOW < PURPLE < BLUE），
/// 不依赖枚举的声明顺序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    None,
    Yellow,
    Purple,
    Blue,
}

impl Color {
    /// 颜色的固定数值等级，用于地块对的规范排序与打分。
    pub fn rank(self) -> u8 {
        match self {
            Color::None => 0,
            Color::Yellow => 1,
            Color::Purple => 2,
            Color::Blue => 3,
        }
    }
}

impl PartialOrd for Color {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Color {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Color::None => "NONE",
            Color::Yellow => "YELLOW",
            Color::Purple => "PURPLE",
            Color::Blue => "BLUE",
        };
        write!(f, "{}", name)
    }
}

/// 单次运行内不变的完整配置。所有百分比字段都按 `值/100` 的乘数解释。
/// 支持从 config.json 部分覆盖，未给出的字段取下方 Default 中的基准值。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    // 经济参数，应随市场价格调整（单位：Chaos / 点生命之力）
    pub yellow_value: f64,
    pub blue_value: f64,
    pub purple_value: f64,
    pub sacred_blossom_value: f64,

    // 地图的基础数量加成（百分比）。
    // 不要把地图品质、碎片、Kirac 附魔或天赋树的加成算进来，
    // 怪物群规模按 floor(基础数量 / 2.6) 从这里推算。
    pub base_map_quantity: i32,

    // 通过六分仪或地图装置保证 Sacred Grove 出现时设为 true
    pub guaranteed_harvest_spawn: bool,

    // 以下是天赋树上的加成。
    // 注意：填写 Grand Design / Wandering Path 生效之后的数值。
    pub bumper_crop: bool,        // 50% 概率出现一组额外收获
    pub bountiful_harvest: bool,  // 10% 概率出现一只额外怪物
    pub heart_of_the_grove: bool, // T4 概率提高 60%，未选中的地块有 10% 概率不枯萎
    pub doubling_season: bool,    // 生命之力有 10% 概率翻倍
    pub crop_rotation: bool,      // 收获只出现 T1 植物，收割会升级其他颜色的地块

    pub increased_t3_crop_chance: i32,        // 最多 3 个小点，每个 10%
    pub increased_quantity_of_lifeforce: i32, // 最多 6 个小点，每个 3%
    pub duplicated_monsters_chance: i32,      // 最多 2 个小点，每个 3%

    pub additional_sacred_grove_chance: i32,  // 拿满相关天赋为 45%
    pub additional_extra_content_chance: i32, // 屏蔽 Harvest 以外的内容时最多 18%
    pub stream_of_consciousness: bool,        // Sacred Grove 基础出现率提高 50%

    pub reduced_blue_chance: i32, // 拿满相关天赋为 10% + 10% + 25%
    pub reduced_yellow_chance: i32,
    pub reduced_purple_chance: i32,

    pub increased_quantity: i32,            // 天赋树上的小数量点，最多 15%
    pub increased_map_modifier_effect: i32, // 天赋树上的小词缀效果点，最多 30%
    pub increased_pack_size: i32,           // Grand Design 每个关键天赋提供 1%

    // 以下是制作带来的加成（按百分比或整数填写）
    pub map_quality: i32,          // 正常情况最多 20，计入地图数量
    pub kirac_craft_quantity: i32, // 免费 Kirac 附魔最多 0.08
    pub fragment_quantity: i32,    // 例如每个 Sacrifice 碎片 5%
    pub fragment_pack_size: i32,   // Growing Hordes 的怪物群规模填这里

    // 生命之力翻倍并保证出现指定颜色的六分仪
    pub blue_sextant: bool,
    pub yellow_sextant: bool,
    pub purple_sextant: bool,

    // 六分仪的两种建模方式：true 表示重掷整组颜色直到出现指定颜色；
    // false 表示只把每组收获中一块田的颜色替换为指定颜色。
    pub sextant_reroll_implementation: bool,

    // 以下参数来自大量实测，除低置信度的条目外不建议修改
    pub t4_lifeforce: f64, // 低置信度
    pub t3_lifeforce: f64,
    pub t2_lifeforce: f64,
    pub t1_lifeforce: f64,
    pub t4_dropchance: f64,
    pub t3_dropchance: f64,
    pub t2_dropchance: f64,
    pub t1_dropchance: f64,
    pub t4_seed_chance: f64,            // 低置信度
    pub sacred_blossom_dropchance: f64, // 低置信度
    pub t2_binom_n: u32,
    pub t2_binom_p: f64,
    pub t3_binom_n: u32,
    pub t3_binom_p: f64,
    pub base_sacred_grove_chance: f64, // 数据来自 poedb，是小数不是百分比
    pub base_three_harvest_chance: f64, // Sacred Grove 出现 3 组收获的基础概率
    pub base_four_harvest_chance: f64, // Sacred Grove 出现 4 组收获的基础概率
    pub t1_crop_rotation_upgrade_chance: f64,
    pub t2_crop_rotation_upgrade_chance: f64,
    pub t3_crop_rotation_upgrade_chance: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            yellow_value: 240.0 / 2200.0,
            blue_value: 240.0 / 5000.0,
            purple_value: 240.0 / 4600.0,
            sacred_blossom_value: 240.0,
            base_map_quantity: 60,
            guaranteed_harvest_spawn: false,
            bumper_crop: true,
            bountiful_harvest: true,
            heart_of_the_grove: true,
            doubling_season: true,
            crop_rotation: false,
            increased_t3_crop_chance: 30,
            increased_quantity_of_lifeforce: 18,
            duplicated_monsters_chance: 6,
            additional_sacred_grove_chance: 45,
            additional_extra_content_chance: 14,
            stream_of_consciousness: false,
            reduced_blue_chance: 0,
            reduced_yellow_chance: 0,
            reduced_purple_chance: 0,
            increased_quantity: 15,
            increased_map_modifier_effect: 30,
            increased_pack_size: 0,
            map_quality: 20,
            kirac_craft_quantity: 0,
            fragment_quantity: 0,
            fragment_pack_size: 0,
            blue_sextant: false,
            yellow_sextant: false,
            purple_sextant: false,
            sextant_reroll_implementation: false,
            t4_lifeforce: 235.0,
            t3_lifeforce: 47.0,
            t2_lifeforce: 18.5,
            t1_lifeforce: 7.25,
            t4_dropchance: 1.0,
            t3_dropchance: 1.0,
            t2_dropchance: 0.1,
            t1_dropchance: 0.02,
            t4_seed_chance: 0.01,
            sacred_blossom_dropchance: 0.10,
            t2_binom_n: 8,
            t2_binom_p: 0.75,
            t3_binom_n: 3,
            t3_binom_p: 0.25,
            base_sacred_grove_chance: 0.08,
            base_three_harvest_chance: 0.5,
            base_four_harvest_chance: 0.5,
            t1_crop_rotation_upgrade_chance: 0.25,
            t2_crop_rotation_upgrade_chance: 0.20,
            t3_crop_rotation_upgrade_chance: 0.03,
        }
    }
}

impl Settings {
    pub fn has_sextant(&self) -> bool {
        self.yellow_sextant || self.blue_sextant || self.purple_sextant
    }

    /// 当前生效的六分仪颜色。同时配置多个时按黄、紫、蓝的固定优先级取第一个。
    pub fn sextant_color(&self) -> Option<Color> {
        if self.yellow_sextant {
            Some(Color::Yellow)
        } else if self.purple_sextant {
            Some(Color::Purple)
        } else if self.blue_sextant {
            Some(Color::Blue)
        } else {
            None
        }
    }

    /// 对应颜色每点生命之力的价值。
    pub fn color_value(&self, color: Color) -> f64 {
        match color {
            Color::Yellow => self.yellow_value,
            Color::Purple => self.purple_value,
            Color::Blue => self.blue_value,
            Color::None => 0.0,
        }
    }

    /// 三种颜色的基础抽取权重，固定按 [黄, 紫, 蓝] 的顺序返回。
    pub fn color_weights(&self) -> [f64; 3] {
        [
            1.0 - self.reduced_yellow_chance as f64 / 100.0,
            1.0 - self.reduced_purple_chance as f64 / 100.0,
            1.0 - self.reduced_blue_chance as f64 / 100.0,
        ]
    }
}

/// 一个种子等级的掉落模型。`distribution` 是种子数量的离散概率律，
/// 与 `support`（合法数量 0..=N）一一对应；T1 的数量由其余等级反推，
/// 没有显式的分布对象。
#[derive(Debug, Clone)]
pub struct SeedTier {
    pub base_drop: f64,
    pub drop_chance: f64,
    pub is_boss: bool,
    pub distribution: Option<Vec<f64>>,
    pub support: Vec<u32>,
}

impl SeedTier {
    /// 伯努利分布的等级（T4：一块田至多一颗 boss 种子）。
    pub fn bernoulli(base_drop: f64, drop_chance: f64, is_boss: bool, p: f64) -> Self {
        SeedTier {
            base_drop,
            drop_chance,
            is_boss,
            distribution: Some(vec![1.0 - p, p]),
            support: vec![0, 1],
        }
    }

    /// 二项分布的等级（T2 / T3）。
    pub fn binomial(base_drop: f64, drop_chance: f64, is_boss: bool, n: u32, p: f64) -> Self {
        SeedTier {
            base_drop,
            drop_chance,
            is_boss,
            distribution: Some(utils::binomial_pmf_vec(n, p)),
            support: (0..=n).collect(),
        }
    }

    /// 数量隐式确定的等级（T1）。
    pub fn implicit(base_drop: f64, drop_chance: f64) -> Self {
        SeedTier {
            base_drop,
            drop_chance,
            is_boss: false,
            distribution: None,
            support: (0..=PLANTS_PER_PLOT).collect(),
        }
    }

    /// 把支撑集和 pmf 配成 (种子数, 概率) 的序列；隐式分布返回空序列。
    pub fn outcomes(&self) -> impl Iterator<Item = (u32, f64)> + Clone + '_ {
        let pmf = self.distribution.as_deref().unwrap_or(&[]);
        self.support.iter().copied().zip(pmf.iter().copied())
    }
}

/// 一个离散的价值分布：`support` 严格递增，`probabilities` 与之等长且和为 1。
#[derive(Debug, Clone)]
pub struct ValueDistribution {
    pub support: Vec<f64>,
    pub probabilities: Vec<f64>,
}

impl ValueDistribution {
    pub fn expectation(&self) -> f64 {
        utils::dot(&self.support, &self.probabilities)
    }

    pub fn cdf(&self) -> Vec<f64> {
        utils::cumsum(&self.probabilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_rank_order() {
        assert!(Color::None < Color::Yellow);
        assert!(Color::Yellow < Color::Purple);
        assert!(Color::Purple < Color::Blue);
        assert_eq!(Color::Blue.rank(), 3);
        assert_eq!(Color::None.rank(), 0);
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.base_map_quantity, 60);
        assert_eq!(settings.t2_binom_n, 8);
        assert!(settings.bumper_crop);
        assert!(!settings.guaranteed_harvest_spawn);
        assert!((settings.sacred_blossom_value - 240.0).abs() < 1e-12);
    }

    #[test]
    fn test_settings_partial_override_from_json() {
        let settings: Settings =
            serde_json::from_str(r#"{"base_map_quantity": 0, "guaranteed_harvest_spawn": true}"#)
                .unwrap();
        assert_eq!(settings.base_map_quantity, 0);
        assert!(settings.guaranteed_harvest_spawn);
        // 未覆盖的字段保持默认值
        assert_eq!(settings.map_quality, 20);
        assert!((settings.t3_binom_p - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_sextant_color_priority() {
        let mut settings = Settings::default();
        assert_eq!(settings.sextant_color(), None);
        settings.blue_sextant = true;
        assert_eq!(settings.sextant_color(), Some(Color::Blue));
        settings.yellow_sextant = true;
        assert_eq!(settings.sextant_color(), Some(Color::Yellow));
        assert!(settings.has_sextant());
    }

    #[test]
    fn test_seed_tier_constructors() {
        let t4 = SeedTier::bernoulli(235.0, 1.0, true, 0.01);
        assert_eq!(t4.support, vec![0, 1]);
        let pmf = t4.distribution.as_deref().unwrap();
        assert!((pmf.iter().sum::<f64>() - 1.0).abs() < 1e-12);

        let t2 = SeedTier::binomial(18.5, 0.1, false, 8, 0.75);
        assert_eq!(t2.support.len(), 9);
        let pmf = t2.distribution.as_deref().unwrap();
        assert!((pmf.iter().sum::<f64>() - 1.0).abs() < 1e-12);

        let t1 = SeedTier::implicit(7.25, 0.02);
        assert!(t1.distribution.is_none());
        assert_eq!(t1.outcomes().count(), 0);
    }

    #[test]
    fn test_value_distribution_expectation() {
        let dist = ValueDistribution {
            support: vec![1.0, 2.0, 4.0],
            probabilities: vec![0.5, 0.25, 0.25],
        };
        assert!((dist.expectation() - 2.0).abs() < 1e-12);
        assert!((dist.cdf().last().unwrap() - 1.0).abs() < 1e-12);
    }
}
