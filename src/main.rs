//! src/main.rs
//!
//! 程序的主入口。
//! 负责协调各个模块：扫描基础地图数量、对比几套天赋预设的期望收益，
//! 打印当前配置的单点结果；Crop Rotation 开启时额外演示一次离散收割模拟。

use rayon::prelude::*;
use std::time::Instant;

mod calculator;
mod config;
mod models;
mod simulator;
mod utils;

fn main() {
    // 1. 启动计时器
    let start_time = Instant::now();

    // 2. 加载配置（config.json 可选，缺省时使用基准默认值）
    let settings = match config::load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("\n错误：加载配置失败。\n原因: {}", e);
            return;
        }
    };

    // 3. 扫描基础地图数量，对比三套天赋预设
    let map_quantities: Vec<i32> = (0..=120).step_by(10).collect();
    let rows: Vec<(i32, f64, f64, f64)> = map_quantities
        .par_iter()
        .map(|&base_map_quantity| {
            let mut regular = config::regular_atlas_settings();
            regular.base_map_quantity = base_map_quantity;
            let mut wandering = config::wandering_path_atlas_settings();
            wandering.base_map_quantity = base_map_quantity;
            let mut grand_design = config::grand_design_atlas_settings();
            grand_design.base_map_quantity = base_map_quantity;
            (
                base_map_quantity,
                calculator::get_overall_map_value(&regular),
                calculator::get_overall_map_value(&wandering),
                calculator::get_overall_map_value(&grand_design),
            )
        })
        .collect();

    println!("每张地图的期望收益对比（Chaos）");
    println!(
        "{:<12} | {:<14} | {:<14} | {:<14}",
        "基础数量", "Regular Tree", "Wandering Path", "Grand Design"
    );
    println!("{:-<14}+{:-<16}+{:-<16}+{:-<16}", "", "", "", "");
    for (base_map_quantity, regular, wandering, grand_design) in &rows {
        println!(
            "{:<12} | {:>14.4} | {:>14.4} | {:>14.4}",
            base_map_quantity, regular, wandering, grand_design
        );
    }

    // 4. 当前配置的单点结果
    let (area_iiq, pack_size) = calculator::get_area_stats(&settings);
    let active_bonuses = [
        ("Bumper Crop", settings.bumper_crop),
        ("Bountiful Harvest", settings.bountiful_harvest),
        ("Heart of the Grove", settings.heart_of_the_grove),
        ("Doubling Season", settings.doubling_season),
        ("Stream of Consciousness", settings.stream_of_consciousness),
        ("Crop Rotation", settings.crop_rotation),
    ];
    let active_names: Vec<&str> = active_bonuses
        .iter()
        .filter(|(_, enabled)| *enabled)
        .map(|(name, _)| *name)
        .collect();
    println!("\n当前配置：IIQ {}%，怪物群规模 {}%", area_iiq, pack_size);
    println!(
        "已启用天赋：{}",
        if active_names.is_empty() {
            "无".to_string()
        } else {
            active_names.join(", ")
        }
    );
    println!(
        "每张地图的期望收益: {:.4} Chaos",
        calculator::get_overall_map_value(&settings)
    );
    let mut baseline = config::no_atlas_settings();
    baseline.base_map_quantity = settings.base_map_quantity;
    println!(
        "无天赋基准的期望收益: {:.4} Chaos",
        calculator::get_overall_map_value(&baseline)
    );

    // 5. Crop Rotation 模式：演示一次完整的收割轨迹
    if settings.crop_rotation {
        println!("\nCrop Rotation 模拟（每行一组：颜色 T1 T2 T3 T4）");
        let mut rng = rand::thread_rng();
        let mut layout = simulator::HarvestLayout::create_random_harvest(&settings, &mut rng);
        layout.sort();
        while !layout.is_empty() {
            println!("{}\n", layout);
            layout = match layout.harvest(0, 0, &mut rng) {
                Ok(next) => next,
                Err(e) => {
                    eprintln!("{}", e);
                    break;
                }
            };
        }
    }

    // 6. 停止计时器并打印性能报告
    let duration = start_time.elapsed();
    println!("总计算耗时: {:.2?}", duration);
}
