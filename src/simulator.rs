//! src/simulator.rs
//!
//! Crop Rotation 天赋下单次 Sacred Grove 的离散事件模拟。
//! 布局由若干组地块对构成；每次收割消耗一组，并按二项跃迁
//! 随机升级其余地块的种子等级。所有转移都返回新的布局，
//! 随机源由调用方注入以便复现。

use crate::models::{Color, Settings, NO_WILT_CHANCE, PLANTS_PER_PLOT};
use rand::Rng;
use std::fmt;

/// 一块田：颜色加上 T2/T3/T4 的种子数。
/// T1 数量恒为 23 减去三者之和，不单独存储。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropPlot {
    pub color: Color,
    pub t2_seeds: u32,
    pub t3_seeds: u32,
    pub t4_seeds: u32,
}

impl CropPlot {
    /// 全部为 T1 植物的新田（Crop Rotation 下收获的初始状态）。
    pub fn new_t1(color: Color) -> Self {
        CropPlot {
            color,
            t2_seeds: 0,
            t3_seeds: 0,
            t4_seeds: 0,
        }
    }

    pub fn t1_seeds(&self) -> u32 {
        PLANTS_PER_PLOT - self.t2_seeds - self.t3_seeds - self.t4_seeds
    }
}

impl fmt::Display for CropPlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.color,
            self.t1_seeds(),
            self.t2_seeds,
            self.t3_seeds,
            self.t4_seeds
        )
    }
}

/// n 次独立伯努利试验的成功数。n ≤ 23，逐次模拟即可。
fn binomial_draw(n: u32, p: f64, rng: &mut impl Rng) -> u32 {
    (0..n).filter(|_| rng.gen_bool(p)).count() as u32
}

/// 对一块田做一次随机升级。
/// 三次二项抽取顺序相关：T2 的晋升来自旧的 T1 数量，T3 来自旧的 T2，
/// T4 来自旧的 T3；新数量 = 旧数量 + 晋升进来 − 晋升出去。
/// 返回新的田，原值不变。
pub fn upgrade_crop(crop: &CropPlot, settings: &Settings, rng: &mut impl Rng) -> CropPlot {
    let upgraded_t1 = binomial_draw(crop.t1_seeds(), settings.t1_crop_rotation_upgrade_chance, rng);
    let upgraded_t2 = binomial_draw(crop.t2_seeds, settings.t2_crop_rotation_upgrade_chance, rng);
    let upgraded_t3 = binomial_draw(crop.t3_seeds, settings.t3_crop_rotation_upgrade_chance, rng);
    CropPlot {
        color: crop.color,
        t2_seeds: crop.t2_seeds + upgraded_t1 - upgraded_t2,
        t3_seeds: crop.t3_seeds + upgraded_t2 - upgraded_t3,
        t4_seeds: crop.t4_seeds + upgraded_t3,
    }
}

/// 一组收获：两块田，第二块可以缺省（单块组）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropPair {
    pub plot_1: CropPlot,
    pub plot_2: Option<CropPlot>,
}

impl CropPair {
    pub fn len(&self) -> usize {
        if self.plot_2.is_some() {
            2
        } else {
            1
        }
    }

    /// 按序号取田；单块组只接受序号 0。
    pub fn get(&self, index: usize) -> Option<&CropPlot> {
        match index {
            0 => Some(&self.plot_1),
            1 => self.plot_2.as_ref(),
            _ => None,
        }
    }

    /// 规范化组内顺序：颜色等级高的田放在前面。
    pub fn sort(&mut self) {
        if let Some(plot_2) = self.plot_2 {
            if self.plot_1.color < plot_2.color {
                self.plot_2 = Some(self.plot_1);
                self.plot_1 = plot_2;
            }
        }
    }

    /// 已排序的组映射为 1–9 的整数分值，用于全局收割顺序：
    /// 单块组取颜色等级 1–3；蓝色领头的双块组 7–9；
    /// 紫色领头 5–7；黄色双块组固定为 4。
    pub fn color_score(&self) -> u8 {
        match self.plot_2 {
            None => self.plot_1.color.rank(),
            Some(plot_2) => match self.plot_1.color {
                Color::Blue => plot_2.color.rank() + 6,
                Color::Purple => plot_2.color.rank() + 4,
                _ => 4,
            },
        }
    }

    /// 按权重掷出两块田的颜色。
    fn roll_crop_colors(settings: &Settings, rng: &mut impl Rng) -> [Color; 2] {
        let [yellow_weight, purple_weight, blue_weight] = settings.color_weights();
        let total_weight = yellow_weight + purple_weight + blue_weight;
        let blue_chance = blue_weight / total_weight;
        let purple_chance = purple_weight / total_weight;
        let mut colors = [Color::None; 2];
        for color in colors.iter_mut() {
            let color_roll: f64 = rng.gen_range(0.0..1.0);
            *color = if color_roll < blue_chance {
                Color::Blue
            } else if color_roll < blue_chance + purple_chance {
                Color::Purple
            } else {
                Color::Yellow
            };
        }
        colors
    }

    /// 随机生成一组收获。六分仪的两种实现都在这里生效：
    /// 重掷实现用拒绝采样直到保底颜色出现，
    /// 替换实现以各 50% 的概率改写第一块或第二块的颜色。
    pub fn create_random_crop_pair(settings: &Settings, rng: &mut impl Rng) -> CropPair {
        let colors = match settings.sextant_color() {
            Some(sextant_color) if settings.sextant_reroll_implementation => {
                let mut colors = Self::roll_crop_colors(settings, rng);
                while colors[0] != sextant_color && colors[1] != sextant_color {
                    colors = Self::roll_crop_colors(settings, rng);
                }
                colors
            }
            Some(sextant_color) => {
                let mut colors = Self::roll_crop_colors(settings, rng);
                if rng.gen_bool(0.5) {
                    colors[0] = sextant_color;
                } else {
                    colors[1] = sextant_color;
                }
                colors
            }
            None => Self::roll_crop_colors(settings, rng),
        };
        CropPair {
            plot_1: CropPlot::new_t1(colors[0]),
            plot_2: Some(CropPlot::new_t1(colors[1])),
        }
    }
}

impl fmt::Display for CropPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.plot_1)?;
        if let Some(plot_2) = &self.plot_2 {
            write!(f, ", {}", plot_2)?;
        }
        Ok(())
    }
}

/// 一次 Sacred Grove 事件的完整布局：有序的地块组序列加上生效的配置。
#[derive(Debug, Clone)]
pub struct HarvestLayout<'a> {
    pub harvests: Vec<CropPair>,
    pub settings: &'a Settings,
}

impl<'a> HarvestLayout<'a> {
    /// 随机生成一个布局：基础 3 组，按 base_four_harvest_chance 加一组，
    /// Bumper Crop 下再有 50% 概率加一组。
    pub fn create_random_harvest(settings: &'a Settings, rng: &mut impl Rng) -> Self {
        let mut num_pairs = 3;
        if rng.gen_range(0.0..1.0) < settings.base_four_harvest_chance {
            num_pairs += 1;
        }
        if settings.bumper_crop && rng.gen_bool(0.5) {
            num_pairs += 1;
        }
        let harvests = (0..num_pairs)
            .map(|_| CropPair::create_random_crop_pair(settings, rng))
            .collect();
        HarvestLayout { harvests, settings }
    }

    pub fn len(&self) -> usize {
        self.harvests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.harvests.is_empty()
    }

    /// 规范展示顺序：先排好每组内部，再按 color_score 从高到低排列全组。
    /// 这只是“先收割最值钱的一组”的呈现约定，转移本身不依赖它。
    pub fn sort(&mut self) {
        for pair in &mut self.harvests {
            pair.sort();
        }
        self.harvests
            .sort_by(|a, b| b.color_score().cmp(&a.color_score()));
    }

    /// 收割指定组里的指定田，返回新的布局。
    ///
    /// 被收割的组从布局中移除；其余每块田如果颜色与所选颜色不同，
    /// 就按二项跃迁随机升级一次，相同则保持原样。
    /// Heart of the Grove 下，双块组被收割时未选中的那块
    /// 有 10% 概率不枯萎，作为新的单块组插入，插入位置保持
    /// 单块组之间颜色等级降序。
    pub fn harvest(
        &self,
        harvest_index: usize,
        crop_index: usize,
        rng: &mut impl Rng,
    ) -> Result<HarvestLayout<'a>, String> {
        let Some(chosen_pair) = self.harvests.get(harvest_index) else {
            return Err(format!(
                "无效的收获序号 {}（布局共 {} 组）：\n{}",
                harvest_index,
                self.harvests.len(),
                self
            ));
        };
        let Some(chosen_plot) = chosen_pair.get(crop_index) else {
            return Err(format!(
                "无效的地块序号 {}（收获 {} 只有 {} 块田）：\n{}",
                crop_index,
                harvest_index,
                chosen_pair.len(),
                self
            ));
        };
        let chosen_color = chosen_plot.color;

        let mut new_harvests = Vec::with_capacity(self.harvests.len());
        for (index, pair) in self.harvests.iter().enumerate() {
            if index == harvest_index {
                continue;
            }
            let plot_1 = if pair.plot_1.color == chosen_color {
                pair.plot_1
            } else {
                upgrade_crop(&pair.plot_1, self.settings, rng)
            };
            let plot_2 = pair.plot_2.map(|plot| {
                if plot.color == chosen_color {
                    plot
                } else {
                    upgrade_crop(&plot, self.settings, rng)
                }
            });
            new_harvests.push(CropPair { plot_1, plot_2 });
        }

        if self.settings.heart_of_the_grove
            && chosen_pair.plot_2.is_some()
            && rng.gen_bool(NO_WILT_CHANCE)
        {
            let unwilted = if crop_index == 0 {
                chosen_pair.plot_2
            } else {
                Some(chosen_pair.plot_1)
            };
            if let Some(unwilted) = unwilted {
                let unwilted = if unwilted.color == chosen_color {
                    unwilted
                } else {
                    upgrade_crop(&unwilted, self.settings, rng)
                };
                // 插入位置：第一个颜色等级低于它的单块组之前
                let insert_point = new_harvests
                    .iter()
                    .position(|pair| pair.plot_2.is_none() && pair.plot_1.color < unwilted.color)
                    .unwrap_or(new_harvests.len());
                new_harvests.insert(
                    insert_point,
                    CropPair {
                        plot_1: unwilted,
                        plot_2: None,
                    },
                );
            }
        }

        Ok(HarvestLayout {
            harvests: new_harvests,
            settings: self.settings,
        })
    }
}

impl fmt::Display for HarvestLayout<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, pair) in self.harvests.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", pair)?;
        }
        Ok(())
    }
}
