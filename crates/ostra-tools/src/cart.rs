// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure cart mutation. Prices held here are advisory; order creation
//! recomputes them from the catalog.

use ostra_core::types::CartLine;

/// Add a line to the cart, merging quantity into an existing line with the
/// same product id.
pub fn merge_line(cart: &mut Vec<CartLine>, line: CartLine) {
    if let Some(existing) = cart.iter_mut().find(|l| l.product_id == line.product_id) {
        existing.quantity += line.quantity;
        // The catalog may have repriced since the first add.
        existing.unit_price = line.unit_price;
    } else {
        cart.push(line);
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    use super::*;

    fn line(product_id: &str, quantity: u32) -> CartLine {
        CartLine {
            product_id: product_id.to_string(),
            name: "Устрицы Хасанские".to_string(),
            quantity,
            unit: "шт".to_string(),
            unit_price: Decimal::new(45000, 2),
        }
    }

    #[test]
    fn distinct_products_append() {
        let mut cart = Vec::new();
        merge_line(&mut cart, line("a", 2));
        merge_line(&mut cart, line("b", 1));
        assert_eq!(cart.len(), 2);
    }

    #[test]
    fn same_product_merges_quantity() {
        let mut cart = Vec::new();
        merge_line(&mut cart, line("a", 2));
        merge_line(&mut cart, line("a", 3));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, 5);
    }

    proptest! {
        // Adding a then b is indistinguishable from adding a+b once.
        #[test]
        fn split_adds_equal_single_add(a in 1u32..1000, b in 1u32..1000) {
            let mut split = Vec::new();
            merge_line(&mut split, line("a", a));
            merge_line(&mut split, line("a", b));

            let mut single = Vec::new();
            merge_line(&mut single, line("a", a + b));

            prop_assert_eq!(split, single);
        }
    }
}
