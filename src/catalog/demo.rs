use crate::models::Product;

struct DemoProduct {
    id: &'static str,
    name: &'static str,
    price: &'static str,
    product_type: &'static str,
    category: &'static str,
    style: &'static str,
    material: &'static str,
    color_tags: &'static [&'static str],
    description: &'static str,
    images: &'static [&'static str],
    image_path: &'static str,
    sizes: &'static [&'static str],
    colors: &'static [&'static str],
    reasons: &'static [&'static str],
}

const DEMO: &[DemoProduct] = &[
    DemoProduct {
        id: "prod1",
        name: "Classic Red Cotton T-Shirt",
        price: "$19.99",
        product_type: "T-Shirt",
        category: "Apparel",
        style: "Casual",
        material: "Cotton",
        color_tags: &["red", "solid"],
        description: "A comfortable and stylish red t-shirt made from 100% cotton. Perfect for everyday wear.",
        images: &[
            "https://via.placeholder.com/400x450/FF6347/FFFFFF?Text=RedTee1",
            "https://via.placeholder.com/400x450/CD5C5C/FFFFFF?Text=RedTee2",
        ],
        image_path: "static/product_images/red_tshirt.jpg",
        sizes: &["S", "M", "L"],
        colors: &["Red", "Dark Red"],
        reasons: &["Matches color 'Red'"],
    },
    DemoProduct {
        id: "prod2",
        name: "Blue Slim-Fit Denim Jeans",
        price: "$49.99",
        product_type: "Jeans",
        category: "Apparel",
        style: "Casual",
        material: "Denim",
        color_tags: &["blue", "denim"],
        description: "Perfectly fitting blue slim-fit denim jeans. A wardrobe staple.",
        images: &["https://via.placeholder.com/400x450/1E90FF/FFFFFF?Text=BlueJeans1"],
        image_path: "static/product_images/blue_jeans.jpg",
        sizes: &["28", "30", "32"],
        colors: &["Blue"],
        reasons: &["Pairs with T-Shirts"],
    },
    DemoProduct {
        id: "prod3",
        name: "Stylish Grey Running Sneakers",
        price: "$79.00",
        product_type: "Sneakers",
        category: "Footwear",
        style: "Sporty",
        material: "Mesh",
        color_tags: &["grey", "black", "athletic"],
        description: "Comfortable and trendy grey running sneakers with breathable mesh. Ideal for workouts or casual outings.",
        images: &[
            "https://via.placeholder.com/400x450/D3D3D3/000000?Text=Sneakers1",
            "https://via.placeholder.com/400x450/A9A9A9/FFFFFF?Text=Sneakers2",
        ],
        image_path: "static/product_images/grey_sneakers.jpg",
        sizes: &["8", "9", "10"],
        colors: &["Grey", "Black"],
        reasons: &["Good for athletic wear"],
    },
    DemoProduct {
        id: "prod4",
        name: "Summer Floral Maxi Dress",
        price: "$65.00",
        product_type: "Dress",
        category: "Apparel",
        style: "Bohemian",
        material: "Rayon",
        color_tags: &["pink", "floral", "multi-color", "summer"],
        description: "Light and airy floral maxi dress for summer, bohemian style. Features a vibrant floral print.",
        images: &["https://via.placeholder.com/400x450/FFC0CB/000000?Text=FloralDress1"],
        image_path: "static/product_images/floral_dress.jpg",
        sizes: &["S", "M", "L"],
        colors: &["Pink Floral"],
        reasons: &["Vibe: Summer", "Pattern: Floral"],
    },
    DemoProduct {
        id: "prod5",
        name: "Classic Brown Leather Belt",
        price: "$25.00",
        product_type: "Belt",
        category: "Accessory",
        style: "Classic",
        material: "Leather",
        color_tags: &["brown", "leather"],
        description: "Classic brown genuine leather belt with a timeless buckle. Adds a polished touch to any outfit.",
        images: &["https://via.placeholder.com/400x450/8B4513/FFFFFF?Text=Belt1"],
        image_path: "static/product_images/leather_belt.jpg",
        sizes: &["One Size"],
        colors: &["Brown"],
        reasons: &["Accessory for Jeans"],
    },
    DemoProduct {
        id: "prod6",
        name: "Comfy Light Blue Hoodie",
        price: "$55.99",
        product_type: "Hoodie",
        category: "Apparel",
        style: "Casual",
        material: "Fleece",
        color_tags: &["blue", "light blue", "cozy"],
        description: "A very comfortable light blue hoodie made of soft fleece. Features a kangaroo pocket and drawstring hood.",
        images: &["https://via.placeholder.com/400x450/B0C4DE/000000?Text=Hoodie1"],
        image_path: "static/product_images/blue_hoodie.jpg",
        sizes: &["M", "L", "XL"],
        colors: &["Light Blue"],
        reasons: &["Great for cool evenings"],
    },
];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Six hand-written products used when no catalog file is present.
pub fn demo_products() -> Vec<Product> {
    DEMO.iter()
        .map(|d| Product {
            id: d.id.to_string(),
            name: d.name.to_string(),
            price: d.price.to_string(),
            description: d.description.to_string(),
            product_type: d.product_type.to_string(),
            category: d.category.to_string(),
            style: d.style.to_string(),
            material: d.material.to_string(),
            color_tags: owned(d.color_tags),
            sizes: owned(d.sizes),
            colors: owned(d.colors),
            images: owned(d.images),
            image_path_for_ai: Some(d.image_path.to_string()),
            detailed_reasons: owned(d.reasons),
            ..Default::default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_demo_ids_unique() {
        let products = demo_products();
        let ids: HashSet<_> = products.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids.len(), products.len());
    }

    #[test]
    fn test_demo_products_have_images_and_prices() {
        for p in demo_products() {
            assert!(!p.images.is_empty(), "{} has no image", p.id);
            assert!(p.price.starts_with('$'), "{} price {}", p.id, p.price);
        }
    }
}
