use super::view::{ColMajor, RowMajor, RowMajorMut};

/// Reference multiply: `res = A^T · W` with a plain b-o-i triple loop.
///
/// This is the textbook loop order. It reads A down a column (stride 1) but
/// walks W with stride `O` in the innermost loop, so it's slow on large
/// matrices. It exists as the correctness oracle for the tiled kernel, not
/// for speed.
///
/// `res` is overwritten, not accumulated into.
///
/// # Arguments
///
/// * `a` - Matrix A (B × I), column-major
/// * `w` - Matrix W (I × O), row-major
/// * `res` - Matrix Res (B × O), row-major
///
/// # Panics
///
/// Panics if the three views don't describe the same B, I, O.
pub fn matmul_reference(a: ColMajor<'_>, w: RowMajor<'_>, res: &mut RowMajorMut<'_>) {
    assert_eq!(a.cols(), w.rows(), "A has {} columns, W has {} rows", a.cols(), w.rows());
    assert_eq!(res.rows(), a.rows(), "Res has {} rows, A has {}", res.rows(), a.rows());
    assert_eq!(res.cols(), w.cols(), "Res has {} columns, W has {}", res.cols(), w.cols());

    for b in 0..a.rows() {
        for o in 0..w.cols() {
            let mut sum = 0.0f32;
            for i in 0..a.cols() {
                sum += a.get(b, i) * w.get(i, o);
            }
            res.set(b, o, sum);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_2x3_times_3x2() {
        // A^T is [[1, 2, 3], [4, 5, 6]]; stored column-major that's
        // column 0 = (1, 4), column 1 = (2, 5), column 2 = (3, 6).
        let a = [1.0, 4.0, 2.0, 5.0, 3.0, 6.0];
        let w = [7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
        let mut out = [-1.0; 4];

        let a = ColMajor::new(&a, 2, 3).unwrap();
        let w = RowMajor::new(&w, 3, 2).unwrap();
        let mut res = RowMajorMut::new(&mut out, 2, 2).unwrap();
        matmul_reference(a, w, &mut res);

        assert_eq!(out, [58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    #[should_panic(expected = "A has 3 columns")]
    fn test_reference_dimension_mismatch() {
        let a = [0.0; 6];
        let w = [0.0; 8];
        let mut out = [0.0; 8];
        matmul_reference(
            ColMajor::new(&a, 2, 3).unwrap(),
            RowMajor::new(&w, 2, 4).unwrap(),
            &mut RowMajorMut::new(&mut out, 2, 4).unwrap(),
        );
    }
}
