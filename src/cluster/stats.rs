use regex::Regex;

use super::cluster::{ClusterRef, Stats};

/// Recomputes the stats of every cluster in the subtree, post-order.
/// Returns (total_ram, total_cpu, phone_count) so a parent can accumulate
/// without walking the subtree again.
pub fn compute_stats(cluster: &ClusterRef) -> (f64, f64, usize) {
    let number = Regex::new(r"[0-9.]+").expect("number pattern is valid");
    aggregate(cluster, &number)
}

fn aggregate(cluster: &ClusterRef, number: &Regex) -> (f64, f64, usize) {
    let mut total_ram = 0.0;
    let mut total_cpu = 0.0;
    let mut phones = 0;

    {
        let cluster = cluster.borrow();
        for phone in &cluster.children_phones {
            let phone = phone.borrow();
            // descriptors with no parseable number still count as a phone
            total_ram += leading_number(number, &phone.ram).unwrap_or(0.0);
            total_cpu += leading_number(number, &phone.cpu).unwrap_or(0.0);
            phones += 1;
        }
        for child in &cluster.children_clusters {
            let (ram, cpu, count) = aggregate(child, number);
            total_ram += ram;
            total_cpu += cpu;
            phones += count;
        }
    }

    let mut cluster = cluster.borrow_mut();
    cluster.stats = if phones > 0 {
        Stats {
            avg_ram: total_ram / phones as f64,
            avg_cpu: total_cpu / phones as f64,
        }
    } else {
        Stats::default()
    };

    (total_ram, total_cpu, phones)
}

/// First contiguous run of digits and dots, parsed as a float.
/// "8GB" -> 8.0, "around 2.4 GHz" -> 2.4, "fast" -> None. A magnitude
/// too large for f64 also counts as unparseable, stats must stay finite.
fn leading_number(number: &Regex, descriptor: &str) -> Option<f64> {
    number
        .find(descriptor)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::cluster::{Cluster, Phone, PhoneRef};

    fn cluster(name: &str) -> ClusterRef {
        Rc::new(RefCell::new(Cluster {
            name: name.to_string(),
            ..Default::default()
        }))
    }

    fn phone(ram: &str, cpu: &str) -> PhoneRef {
        Rc::new(RefCell::new(Phone {
            name: "phone".to_string(),
            ram: ram.to_string(),
            cpu: cpu.to_string(),
            ..Default::default()
        }))
    }

    #[test]
    fn test_leading_number() {
        let number = Regex::new(r"[0-9.]+").unwrap();
        assert_eq!(leading_number(&number, "8GB"), Some(8.0));
        assert_eq!(leading_number(&number, "around 2.4 GHz"), Some(2.4));
        assert_eq!(leading_number(&number, "fast"), None);
        // all dots matches the pattern but is not a number
        assert_eq!(leading_number(&number, "..."), None);
    }

    #[test]
    fn test_averages_over_direct_phones() {
        let root = cluster("root");
        root.borrow_mut().children_phones.push(phone("8GB", "4 Cores"));
        root.borrow_mut().children_phones.push(phone("4GB", "2 Cores"));

        let (ram, cpu, count) = compute_stats(&root);
        assert_eq!((ram, cpu, count), (12.0, 6.0, 2));
        assert_eq!(root.borrow().stats.avg_ram, 6.0);
        assert_eq!(root.borrow().stats.avg_cpu, 3.0);
    }

    #[test]
    fn test_zero_phones_means_exactly_zero_stats() {
        let root = cluster("root");
        root.borrow_mut().children_clusters.push(cluster("empty"));

        compute_stats(&root);
        assert_eq!(root.borrow().stats.avg_ram, 0.0);
        assert_eq!(root.borrow().stats.avg_cpu, 0.0);
        let child = root.borrow().children_clusters[0].clone();
        assert_eq!(child.borrow().stats.avg_ram, 0.0);
    }

    #[test]
    fn test_averages_propagate_through_nesting() {
        // root -> edge -> two phones, so both levels average the same pair
        let root = cluster("root");
        let edge = cluster("edge");
        edge.borrow_mut().children_phones.push(phone("8GB", "8"));
        edge.borrow_mut().children_phones.push(phone("4GB", "4"));
        root.borrow_mut().children_clusters.push(edge);

        compute_stats(&root);
        assert_eq!(root.borrow().stats.avg_ram, 6.0);
        let edge = root.borrow().children_clusters[0].clone();
        assert_eq!(edge.borrow().stats.avg_ram, 6.0);
    }

    #[test]
    fn test_unparseable_descriptor_counts_as_zero() {
        let root = cluster("root");
        root.borrow_mut().children_phones.push(phone("8GB", "4"));
        root.borrow_mut().children_phones.push(phone("plenty", "slow"));

        compute_stats(&root);
        assert_eq!(root.borrow().stats.avg_ram, 4.0);
        assert_eq!(root.borrow().stats.avg_cpu, 2.0);
    }

    #[test]
    fn test_overflowing_magnitude_counts_as_unparseable() {
        let number = Regex::new(r"[0-9.]+").unwrap();
        let huge = "9".repeat(320);
        assert_eq!(leading_number(&number, &huge), None);

        let root = cluster("root");
        root.borrow_mut()
            .children_phones
            .push(phone(&format!("{}GB", huge), "4"));
        root.borrow_mut().children_phones.push(phone("8GB", "4"));

        compute_stats(&root);
        // the phone still counts, its contribution is zero
        assert_eq!(root.borrow().stats.avg_ram, 4.0);
        assert_eq!(root.borrow().stats.avg_cpu, 4.0);
        assert!(root.borrow().stats.avg_ram.is_finite());
    }

    #[test]
    fn test_compute_stats_is_idempotent() {
        let root = cluster("root");
        root.borrow_mut().children_phones.push(phone("8GB", "4"));
        root.borrow_mut().children_phones.push(phone("3GB", "2"));

        compute_stats(&root);
        let first = root.borrow().stats;
        compute_stats(&root);
        assert_eq!(root.borrow().stats, first);
    }
}
