/// Indices of local maxima in `data`.
///
/// A maximum must be strictly higher than the sample before it and than the
/// first differing sample after it. Flat tops report their middle index.
/// The first and last samples are never maxima.
pub fn local_maxima(data: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if data.len() < 3 {
        return peaks;
    }
    let last = data.len() - 1;
    let mut i = 1;
    while i < last {
        if data[i - 1] < data[i] {
            let mut ahead = i + 1;
            while ahead < last && data[ahead] == data[i] {
                ahead += 1;
            }
            if data[ahead] < data[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Drop peaks closer than `distance` samples to a higher one.
///
/// Peaks are visited from highest to lowest; ties keep the later index.
pub fn suppress_close_peaks(data: &[f64], peaks: &[usize], distance: usize) -> Vec<usize> {
    if distance <= 1 || peaks.len() < 2 {
        return peaks.to_vec();
    }
    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| data[peaks[a]].total_cmp(&data[peaks[b]]).then(a.cmp(&b)));

    let mut keep = vec![true; peaks.len()];
    for &current in order.iter().rev() {
        if !keep[current] {
            continue;
        }
        let mut k = current;
        while k > 0 && peaks[current] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = current + 1;
        while k < peaks.len() && peaks[k] - peaks[current] < distance {
            keep[k] = false;
            k += 1;
        }
    }
    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, kept)| kept.then_some(p))
        .collect()
}

/// Local maxima at least `min_distance` samples apart.
pub fn find_peaks(data: &[f64], min_distance: usize) -> Vec<usize> {
    suppress_close_peaks(data, &local_maxima(data), min_distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_interior_maxima_only() {
        let data = [3.0, 1.0, 2.0, 1.0, 4.0, 5.0];
        assert_eq!(local_maxima(&data), vec![2]);
    }

    #[test]
    fn plateau_reports_midpoint() {
        let data = [0.0, 1.0, 2.0, 2.0, 2.0, 1.0, 0.0];
        assert_eq!(local_maxima(&data), vec![3]);
        let rising_plateau = [0.0, 2.0, 2.0, 3.0, 0.0];
        assert_eq!(local_maxima(&rising_plateau), vec![3]);
    }

    #[test]
    fn flat_and_monotonic_have_no_peaks() {
        assert!(local_maxima(&[0.0; 10]).is_empty());
        assert!(local_maxima(&[0.0, 1.0, 2.0, 3.0]).is_empty());
        assert!(local_maxima(&[1.0, 2.0]).is_empty());
    }

    #[test]
    fn distance_keeps_highest() {
        let mut data = vec![0.0; 20];
        data[3] = 0.3;
        data[5] = 1.0;
        data[15] = 0.9;
        assert_eq!(find_peaks(&data, 1), vec![3, 5, 15]);
        assert_eq!(find_peaks(&data, 5), vec![5, 15]);
        assert_eq!(find_peaks(&data, 11), vec![5]);
    }
}
