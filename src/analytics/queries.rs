/// Guests currently checked in.
pub const ACTIVE_GUESTS_SQL: &str = "SELECT COUNT(*) FROM customers WHERE status = 'active'";

/// Revenue from bookings that were not cancelled.
pub const TOTAL_REVENUE_SQL: &str = "SELECT COALESCE(SUM(amount), 0.0) FROM bookings \
     WHERE status IN ('completed', 'confirmed')";

/// Confirmed bookings that have not completed yet.
pub const PENDING_BOOKINGS_SQL: &str = "SELECT COUNT(*) FROM bookings WHERE status = 'confirmed'";

/// Revenue per check-in month for one calendar year. Months without bookings
/// produce no row.
/// Parameters: ?1 = year as four-digit string
pub const MONTHLY_REVENUE_SQL: &str = r#"
SELECT
    CAST(strftime('%m', check_in) AS INTEGER) AS month_num,
    COALESCE(SUM(amount), 0.0) AS revenue
FROM bookings
WHERE status IN ('completed', 'confirmed')
    AND strftime('%Y', check_in) = ?1
GROUP BY month_num
ORDER BY month_num
"#;

/// Customer check-ins per month for one calendar year.
/// Parameters: ?1 = year as four-digit string
pub const MONTHLY_CHECK_INS_SQL: &str = r#"
SELECT
    CAST(strftime('%m', check_in) AS INTEGER) AS month_num,
    COUNT(*) AS check_ins
FROM customers
WHERE strftime('%Y', check_in) = ?1
GROUP BY month_num
ORDER BY month_num
"#;

/// Distinct booking customers, and how many of them booked more than once.
pub const REPEAT_GUESTS_SQL: &str = r#"
SELECT
    COUNT(*) AS total_customers,
    COALESCE(SUM(CASE WHEN booking_count > 1 THEN 1 ELSE 0 END), 0) AS repeat_customers
FROM (
    SELECT customer_id, COUNT(*) AS booking_count
    FROM bookings
    GROUP BY customer_id
) customer_bookings
"#;
