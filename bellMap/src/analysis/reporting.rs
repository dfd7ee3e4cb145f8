use super::stats::DatasetStats;
use crate::analysis::presentation::{bell_card, nearest_card, radius_summary};
use crate::core::query_facade::{NearestBell, ViewSnapshot};

pub fn print_stats_summary(stats: &DatasetStats) {
    println!("\nEmergency Bell Dataset Summary");
    println!("----------------------------------------");
    println!("Generated: {}", stats.generated_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Total bells: {}", stats.total_count);
    println!("  With location: {}", stats.valid_location_count);
    println!("  Without location: {}", stats.invalid_location_count);

    print_counts("By purpose", &stats.purpose_stats);
    print_counts("By site type", &stats.site_type_stats);
    print_counts("By managing authority", &stats.authority_stats);
    println!("----------------------------------------");
}

fn print_counts(title: &str, counts: &std::collections::BTreeMap<String, usize>) {
    println!("{}:", title);
    let mut sorted: Vec<_> = counts.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (key, count) in sorted {
        println!("  {}: {}", key, count);
    }
}

pub fn print_nearest(nearest: Option<&NearestBell>) {
    match nearest {
        Some(nearest) => println!("{}", nearest_card(nearest).render_text()),
        None => println!("No bell with a valid location"),
    }
}

pub fn print_view(view: &ViewSnapshot<'_>, verbose: bool) {
    println!(
        "Center: {:.6}, {:.6} (zoom {}, filter {})",
        view.center.lat, view.center.lng, view.zoom_level, view.filter
    );
    println!("{}", radius_summary(view.radius_km, view.visible.len()));
    if verbose {
        for bell in &view.visible {
            println!("{}", bell_card(bell).render_text());
        }
    }
    if view.highlighted.is_some() {
        print_nearest(view.nearest.as_ref());
    }
}
