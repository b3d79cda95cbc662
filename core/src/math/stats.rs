pub struct StatsHelper;

impl StatsHelper {
    /// Minimum and maximum of the finite samples, or `None` if every sample is masked.
    pub fn finite_extent<I>(samples: I) -> Option<(f32, f32)>
    where
        I: IntoIterator<Item = f32>,
    {
        samples
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |extent, v| match extent {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_of_masked_sequence_is_none() {
        assert_eq!(StatsHelper::finite_extent(Vec::new()), None);
        assert_eq!(StatsHelper::finite_extent(vec![f32::NAN, f32::NAN]), None);
    }

    #[test]
    fn extent_ignores_masked_samples() {
        let extent = StatsHelper::finite_extent(vec![3.0, f32::NAN, -2.5, 7.0]);
        assert_eq!(extent, Some((-2.5, 7.0)));
    }
}
