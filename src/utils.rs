//! src/utils.rs
//!
//! 存放可复用的、无状态的离散分布工具函数。
//! 所有函数都是纯函数，输入约定（支撑集升序、概率非负）由调用方保证。

/// 前缀和，把 pmf 变成 CDF。
pub fn cumsum(values: &[f64]) -> Vec<f64> {
    let mut total = 0.0;
    values
        .iter()
        .map(|&v| {
            total += v;
            total
        })
        .collect()
}

/// 两个等长序列的点积，也就是离散分布的期望 Σ support[i] * pmf[i]。
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// 把 CDF 差分还原成 pmf，第一项为 cdf[0] - 0。
pub fn cdf_to_pmf(cdf: &[f64]) -> Vec<f64> {
    let mut previous = 0.0;
    cdf.iter()
        .map(|&c| {
            let mass = c - previous;
            previous = c;
            mass
        })
        .collect()
}

/// 二项分布 B(n, p) 在 k 处的概率质量。
/// 组合数用乘法累积计算，n 很小（≤ 23），不会有精度问题。
pub fn binomial_pmf(n: u32, p: f64, k: u32) -> f64 {
    let mut coefficient = 1.0;
    for i in 0..k {
        coefficient *= (n - i) as f64 / (i + 1) as f64;
    }
    coefficient * p.powi(k as i32) * (1.0 - p).powi((n - k) as i32)
}

/// 二项分布 B(n, p) 的完整 pmf 向量，对应支撑集 0..=n。
pub fn binomial_pmf_vec(n: u32, p: f64) -> Vec<f64> {
    (0..=n).map(|k| binomial_pmf(n, p, k)).collect()
}

/// 归并两个升序支撑集，严格相等的取值只保留一个。
pub fn merge_supports(support_1: &[f64], support_2: &[f64]) -> Vec<f64> {
    let mut merged = Vec::with_capacity(support_1.len() + support_2.len());
    let mut i = 0;
    let mut j = 0;
    while i < support_1.len() || j < support_2.len() {
        let next = match (support_1.get(i), support_2.get(j)) {
            (Some(&a), Some(&b)) => {
                if a <= b {
                    i += 1;
                    if a == b {
                        j += 1;
                    }
                    a
                } else {
                    j += 1;
                    b
                }
            }
            (Some(&a), None) => {
                i += 1;
                a
            }
            (None, Some(&b)) => {
                j += 1;
                b
            }
            (None, None) => break,
        };
        if merged.last() != Some(&next) {
            merged.push(next);
        }
    }
    merged
}

/// 把定义在 `old_support` 上的 CDF 重采样到 `new_support` 的每个点上。
/// 按 CDF 的阶梯函数语义：对每个新取值，推进旧支撑集直到越过它，
/// 取最后一个被越过的 CDF 值（未越过任何点为 0，越过末尾为 1）。
/// 这是一次 O(n+m) 的归并式扫描，要求两个支撑集都已升序排好。
pub fn distribute_cdf_to_new_support(
    old_support: &[f64],
    new_support: &[f64],
    old_cdf: &[f64],
) -> Vec<f64> {
    let mut old_index = 0;
    let mut old_value = old_support[0];
    let mut old_prob = 0.0;
    let mut new_cdf = Vec::with_capacity(new_support.len());
    for &new_value in new_support {
        while new_value >= old_value {
            old_index += 1;
            if old_index >= old_support.len() {
                old_value = f64::INFINITY;
                old_prob = 1.0;
            } else {
                old_value = old_support[old_index];
                old_prob = old_cdf[old_index - 1];
            }
        }
        new_cdf.push(old_prob);
    }
    new_cdf
}

/// 两个相互独立的随机变量取较大者的分布。
/// 把两边的 CDF 重采样到合并后的支撑集上，逐点相乘
/// （独立性保证 P(max ≤ v) = P(X1 ≤ v) · P(X2 ≤ v)），再差分回 pmf。
pub fn get_max_pmf(
    support_1: &[f64],
    support_2: &[f64],
    pmf_1: &[f64],
    pmf_2: &[f64],
) -> (Vec<f64>, Vec<f64>) {
    let combined_support = merge_supports(support_1, support_2);
    let cdf_1 = distribute_cdf_to_new_support(support_1, &combined_support, &cumsum(pmf_1));
    let cdf_2 = distribute_cdf_to_new_support(support_2, &combined_support, &cumsum(pmf_2));
    let max_cdf: Vec<f64> = cdf_1.iter().zip(cdf_2.iter()).map(|(a, b)| a * b).collect();
    let max_pmf = cdf_to_pmf(&max_cdf);
    (combined_support, max_pmf)
}
